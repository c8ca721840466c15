//! Expression syntax tree

use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum Node {
    Literal(Value),
    Regex(Regex),
    /// `$`, the current context value
    Context,
    /// `$$`, the input object
    Root,
    /// `$name`
    Variable(String),
    /// Bare or back-quoted field name
    Field(String),
    /// `*`, every value of a mapping
    Wildcard,
    /// `a.b.c`, each step is mapped over the previous result
    Path(Vec<Node>),
    /// `step[predicate]`
    Filter {
        base: Box<Node>,
        predicate: Box<Node>,
    },
    /// `[a, b]`
    Array(Vec<Node>),
    /// `f(args)`
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    /// `function($a, $b) { body }`
    Lambda {
        params: Vec<String>,
        body: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    /// `condition ? then : otherwise`
    Condition {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    /// `lhs ~> rhs`
    Chain {
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    /// Unary minus
    Negate(Box<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Concat,
    And,
    Or,
}
