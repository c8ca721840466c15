//! `jsonata:` selectors
//!
//! A JSONata subset, large enough for link rules: path navigation with
//! predicates, array constructors, `~>` chaining, lambdas, conditionals,
//! comparisons, `&` concatenation, regex literals and a handful of string
//! and sequence functions (see [`functions::Builtin`]).
//!
//! Expressions are parsed once when a rule is compiled. Evaluation is pure
//! and never touches anything but the object it is given.

mod ast;
mod eval;
mod functions;
mod lexer;
mod parser;

pub use functions::Builtin;

use super::selector::ExtractedValues;
use super::{LinkError, LinkResult};
use ast::Node;
use eval::{Evaluator, Item};
use serde_json::Value;
use thiserror::Error;

/// Syntax error with the byte offset it was found at
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("at offset {offset}: {message}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Runtime failure while evaluating an expression
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("cannot call {0}: not a function")]
    NotCallable(String),

    #[error("${function} expects {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: String,
        found: usize,
    },
}

/// A compiled expression selector
#[derive(Debug, Clone)]
pub struct ExpressionSelector {
    source: String,
    ast: Node,
}

impl ExpressionSelector {
    pub fn compile(expression: &str) -> LinkResult<Self> {
        let invalid = |reason: String| LinkError::InvalidExpression {
            expression: expression.to_string(),
            reason,
        };

        let ast = parser::parse(expression).map_err(|e| invalid(e.to_string()))?;
        check_calls(&ast, &mut Vec::new()).map_err(invalid)?;

        Ok(Self {
            source: expression.to_string(),
            ast,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate and normalize; evaluation errors yield no values
    pub fn evaluate(&self, object: &Value) -> ExtractedValues {
        match self.evaluate_value(object) {
            Ok(Some(value)) => ExtractedValues::from_values([&value]),
            Ok(None) => ExtractedValues::empty(),
            Err(e) => {
                tracing::debug!(
                    expression = %self.source,
                    error = %e,
                    "Expression selector failed, treating as no values"
                );
                ExtractedValues::empty()
            }
        }
    }

    /// Raw result; `None` when the expression is undefined for this object
    pub fn evaluate_value(&self, object: &Value) -> Result<Option<Value>, EvalError> {
        match Evaluator::new(object).run(&self.ast)? {
            Item::Json(value) => Ok(Some(value)),
            Item::Undefined | Item::Regex(_) | Item::Function(_) => Ok(None),
        }
    }
}

/// Reject calls to names that are neither built in nor bound by a lambda
fn check_calls(node: &Node, bound: &mut Vec<String>) -> Result<(), String> {
    match node {
        Node::Call { callee, args } => {
            if let Node::Variable(name) = callee.as_ref() {
                if Builtin::from_name(name).is_none() && !bound.contains(name) {
                    return Err(format!("unknown function '${}'", name));
                }
            }
            check_calls(callee, bound)?;
            args.iter().try_for_each(|arg| check_calls(arg, bound))
        }
        Node::Lambda { params, body } => {
            let depth = bound.len();
            bound.extend(params.iter().cloned());
            let result = check_calls(body, bound);
            bound.truncate(depth);
            result
        }
        Node::Path(steps) | Node::Array(steps) => {
            steps.iter().try_for_each(|step| check_calls(step, bound))
        }
        Node::Filter { base, predicate } => {
            check_calls(base, bound)?;
            check_calls(predicate, bound)
        }
        Node::Binary { lhs, rhs, .. } | Node::Chain { lhs, rhs } => {
            check_calls(lhs, bound)?;
            check_calls(rhs, bound)
        }
        Node::Condition {
            condition,
            then,
            otherwise,
        } => {
            check_calls(condition, bound)?;
            check_calls(then, bound)?;
            match otherwise {
                Some(otherwise) => check_calls(otherwise, bound),
                None => Ok(()),
            }
        }
        Node::Negate(inner) => check_calls(inner, bound),
        Node::Literal(_)
        | Node::Regex(_)
        | Node::Context
        | Node::Root
        | Node::Variable(_)
        | Node::Field(_)
        | Node::Wildcard => Ok(()),
    }
}
