//! Expression evaluation
//!
//! Values follow the JSONata sequence model closely enough for link rules:
//! navigating into an array maps over its elements and flattens the results,
//! a one-element result unwraps to the element, and an empty result is
//! `Undefined` rather than null.

use super::EvalError;
use super::ast::{BinaryOp, Node};
use super::functions::Builtin;
use crate::links::selector::number_to_string;
use regex::Regex;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::rc::Rc;

/// A runtime value
#[derive(Debug, Clone)]
pub enum Item<'e> {
    Undefined,
    Json(Value),
    Regex(&'e Regex),
    Function(Callable<'e>),
}

impl Item<'_> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Item::Undefined)
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Item::Json(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Callable<'e> {
    Lambda {
        params: &'e [String],
        body: &'e Node,
        scope: Scope<'e>,
    },
    Builtin(Builtin),
}

impl Callable<'_> {
    /// Number of arguments the callable wants from higher-order functions
    pub fn arity(&self) -> usize {
        match self {
            Callable::Lambda { params, .. } => params.len(),
            Callable::Builtin(_) => 1,
        }
    }
}

/// Lexical variable bindings
#[derive(Debug, Clone, Default)]
pub struct Scope<'e> {
    frame: Option<Rc<Frame<'e>>>,
}

#[derive(Debug)]
struct Frame<'e> {
    bindings: Vec<(String, Item<'e>)>,
    parent: Option<Rc<Frame<'e>>>,
}

impl<'e> Scope<'e> {
    fn child(&self, bindings: Vec<(String, Item<'e>)>) -> Scope<'e> {
        Scope {
            frame: Some(Rc::new(Frame {
                bindings,
                parent: self.frame.clone(),
            })),
        }
    }

    fn lookup(&self, name: &str) -> Option<Item<'e>> {
        let mut frame = self.frame.as_deref();
        while let Some(current) = frame {
            if let Some((_, item)) = current.bindings.iter().find(|(n, _)| n == name) {
                return Some(item.clone());
            }
            frame = current.parent.as_deref();
        }
        None
    }
}

/// Evaluates nodes against one input object
pub struct Evaluator<'v> {
    root: &'v Value,
}

impl<'v> Evaluator<'v> {
    pub fn new(root: &'v Value) -> Self {
        Self { root }
    }

    /// Evaluate a whole expression with the input object as context
    pub fn run<'e>(&self, node: &'e Node) -> Result<Item<'e>, EvalError> {
        self.eval(node, &Item::Json(self.root.clone()), &Scope::default())
    }

    pub(super) fn eval<'e>(
        &self,
        node: &'e Node,
        ctx: &Item<'e>,
        scope: &Scope<'e>,
    ) -> Result<Item<'e>, EvalError> {
        match node {
            Node::Literal(value) => Ok(Item::Json(value.clone())),
            Node::Regex(regex) => Ok(Item::Regex(regex)),
            Node::Context => Ok(ctx.clone()),
            Node::Root => Ok(Item::Json(self.root.clone())),
            Node::Variable(name) => Ok(scope
                .lookup(name)
                .or_else(|| {
                    Builtin::from_name(name).map(|b| Item::Function(Callable::Builtin(b)))
                })
                .unwrap_or(Item::Undefined)),
            Node::Field(name) => Ok(field(ctx, name)),
            Node::Wildcard => Ok(wildcard(ctx)),
            Node::Path(steps) => self.path(steps, ctx, scope),
            Node::Filter { base, predicate } => {
                let base = self.eval(base, ctx, scope)?;
                self.filter(base, predicate, scope)
            }
            Node::Array(items) => self.array(items, ctx, scope),
            Node::Call { callee, args } => {
                let function = self.eval(callee, ctx, scope)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, ctx, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply(&function, args, ctx)
            }
            Node::Lambda { params, body } => Ok(Item::Function(Callable::Lambda {
                params,
                body,
                scope: scope.clone(),
            })),
            Node::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs, ctx, scope),
            Node::Condition {
                condition,
                then,
                otherwise,
            } => {
                if truthy(&self.eval(condition, ctx, scope)?) {
                    self.eval(then, ctx, scope)
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise, ctx, scope)
                } else {
                    Ok(Item::Undefined)
                }
            }
            Node::Chain { lhs, rhs } => {
                let value = self.eval(lhs, ctx, scope)?;
                match rhs.as_ref() {
                    // `x ~> $f(a)` is `$f(x, a)`
                    Node::Call { callee, args } => {
                        let function = self.eval(callee, ctx, scope)?;
                        let mut call_args = vec![value];
                        for arg in args {
                            call_args.push(self.eval(arg, ctx, scope)?);
                        }
                        self.apply(&function, call_args, ctx)
                    }
                    other => {
                        let function = self.eval(other, ctx, scope)?;
                        self.apply(&function, vec![value], ctx)
                    }
                }
            }
            Node::Negate(inner) => match self.eval(inner, ctx, scope)? {
                Item::Undefined => Ok(Item::Undefined),
                Item::Json(Value::Number(n)) => Ok(Item::Json(
                    Number::from_f64(-n.as_f64().unwrap_or_default())
                        .map(Value::Number)
                        .unwrap_or(Value::Null),
                )),
                _ => Err(EvalError::TypeMismatch(
                    "cannot negate a non-number".to_string(),
                )),
            },
        }
    }

    /// Invoke a function value
    pub(super) fn apply<'e>(
        &self,
        function: &Item<'e>,
        args: Vec<Item<'e>>,
        ctx: &Item<'e>,
    ) -> Result<Item<'e>, EvalError> {
        match function {
            Item::Function(Callable::Lambda {
                params,
                body,
                scope,
            }) => {
                let mut args = args.into_iter();
                let bindings = params
                    .iter()
                    .map(|param| (param.clone(), args.next().unwrap_or(Item::Undefined)))
                    .collect();
                self.eval(*body, ctx, &scope.child(bindings))
            }
            Item::Function(Callable::Builtin(builtin)) => self.call_builtin(*builtin, args, ctx),
            Item::Undefined => Err(EvalError::NotCallable("undefined".to_string())),
            Item::Json(value) => Err(EvalError::NotCallable(value.to_string())),
            Item::Regex(regex) => Err(EvalError::NotCallable(format!("/{}/", regex.as_str()))),
        }
    }

    fn path<'e>(
        &self,
        steps: &'e [Node],
        ctx: &Item<'e>,
        scope: &Scope<'e>,
    ) -> Result<Item<'e>, EvalError> {
        let mut current = vec![ctx.clone()];
        for step in steps {
            let mut next = Vec::new();
            for item in &current {
                push_flat(&mut next, self.eval(step, item, scope)?);
            }
            if next.is_empty() {
                return Ok(Item::Undefined);
            }
            current = next;
        }
        Ok(collapse(current))
    }

    /// Apply a predicate: numbers select by index, anything else filters
    fn filter<'e>(
        &self,
        base: Item<'e>,
        predicate: &'e Node,
        scope: &Scope<'e>,
    ) -> Result<Item<'e>, EvalError> {
        let sequence = to_sequence(base);
        let len = sequence.len();
        let mut kept = Vec::new();

        for (idx, item) in sequence.into_iter().enumerate() {
            let keep = match self.eval(predicate, &item, scope)? {
                Item::Json(Value::Number(n)) => index_matches(&n, idx, len),
                Item::Json(Value::Array(values))
                    if !values.is_empty() && values.iter().all(Value::is_number) =>
                {
                    values
                        .iter()
                        .filter_map(|v| match v {
                            Value::Number(n) => Some(n),
                            _ => None,
                        })
                        .any(|n| index_matches(n, idx, len))
                }
                other => truthy(&other),
            };
            if keep {
                kept.push(item);
            }
        }

        Ok(collapse(kept))
    }

    fn array<'e>(
        &self,
        items: &'e [Node],
        ctx: &Item<'e>,
        scope: &Scope<'e>,
    ) -> Result<Item<'e>, EvalError> {
        let mut values = Vec::new();
        for node in items {
            match (node, self.eval(node, ctx, scope)?) {
                (_, Item::Undefined) => {}
                // Nested constructors keep their structure
                (Node::Array(_), Item::Json(value)) => values.push(value),
                (_, Item::Json(Value::Array(inner))) => values.extend(inner),
                (_, Item::Json(value)) => values.push(value),
                (_, _) => {
                    return Err(EvalError::TypeMismatch(
                        "functions and regexes cannot be array members".to_string(),
                    ));
                }
            }
        }
        Ok(Item::Json(Value::Array(values)))
    }

    fn binary<'e>(
        &self,
        op: BinaryOp,
        lhs: &'e Node,
        rhs: &'e Node,
        ctx: &Item<'e>,
        scope: &Scope<'e>,
    ) -> Result<Item<'e>, EvalError> {
        match op {
            BinaryOp::And => {
                let result = truthy(&self.eval(lhs, ctx, scope)?)
                    && truthy(&self.eval(rhs, ctx, scope)?);
                return Ok(Item::Json(Value::Bool(result)));
            }
            BinaryOp::Or => {
                let result = truthy(&self.eval(lhs, ctx, scope)?)
                    || truthy(&self.eval(rhs, ctx, scope)?);
                return Ok(Item::Json(Value::Bool(result)));
            }
            _ => {}
        }

        let left = self.eval(lhs, ctx, scope)?;
        let right = self.eval(rhs, ctx, scope)?;

        let result = match op {
            BinaryOp::Concat => {
                Value::String(format!("{}{}", stringify(&left)?, stringify(&right)?))
            }
            BinaryOp::Eq | BinaryOp::NotEq => match (&left, &right) {
                (Item::Json(l), Item::Json(r)) => {
                    Value::Bool(json_equal(l, r) == (op == BinaryOp::Eq))
                }
                _ => Value::Bool(false),
            },
            _ => match (&left, &right) {
                (Item::Json(l), Item::Json(r)) => {
                    let ordering = compare(l, r)?;
                    Value::Bool(match op {
                        BinaryOp::Lt => ordering == Ordering::Less,
                        BinaryOp::LtEq => ordering != Ordering::Greater,
                        BinaryOp::Gt => ordering == Ordering::Greater,
                        _ => ordering != Ordering::Less,
                    })
                }
                _ => Value::Bool(false),
            },
        };

        Ok(Item::Json(result))
    }
}

/// Field access, mapped over arrays
pub(super) fn field<'e>(item: &Item<'e>, name: &str) -> Item<'e> {
    match item {
        Item::Json(Value::Object(map)) => map
            .get(name)
            .cloned()
            .map(Item::Json)
            .unwrap_or(Item::Undefined),
        Item::Json(Value::Array(values)) => {
            let mut out = Vec::new();
            for value in values {
                push_flat(&mut out, field(&Item::Json(value.clone()), name));
            }
            collapse(out)
        }
        _ => Item::Undefined,
    }
}

fn wildcard<'e>(item: &Item<'e>) -> Item<'e> {
    match item {
        Item::Json(Value::Object(map)) => {
            let mut out = Vec::new();
            for value in map.values() {
                push_flat(&mut out, Item::Json(value.clone()));
            }
            collapse(out)
        }
        Item::Json(Value::Array(values)) => {
            let mut out = Vec::new();
            for value in values {
                push_flat(&mut out, wildcard(&Item::Json(value.clone())));
            }
            collapse(out)
        }
        _ => Item::Undefined,
    }
}

/// Append to a sequence, splicing arrays and dropping undefined
pub(super) fn push_flat<'e>(out: &mut Vec<Item<'e>>, item: Item<'e>) {
    match item {
        Item::Undefined => {}
        Item::Json(Value::Array(values)) => out.extend(values.into_iter().map(Item::Json)),
        other => out.push(other),
    }
}

/// Turn a sequence back into a single item
pub(super) fn collapse(mut items: Vec<Item<'_>>) -> Item<'_> {
    match items.len() {
        0 => Item::Undefined,
        1 => items.pop().unwrap_or(Item::Undefined),
        _ => Item::Json(Value::Array(
            items.into_iter().filter_map(Item::into_json).collect(),
        )),
    }
}

/// View any item as a sequence
pub(super) fn to_sequence(item: Item<'_>) -> Vec<Item<'_>> {
    match item {
        Item::Undefined => Vec::new(),
        Item::Json(Value::Array(values)) => values.into_iter().map(Item::Json).collect(),
        other => vec![other],
    }
}

fn index_matches(n: &Number, idx: usize, len: usize) -> bool {
    let Some(position) = n.as_f64().map(|f| f.floor() as i64) else {
        return false;
    };
    let position = if position < 0 {
        len as i64 + position
    } else {
        position
    };
    position == idx as i64
}

/// JSONata boolean casting
pub(super) fn truthy(item: &Item<'_>) -> bool {
    match item {
        Item::Json(value) => json_truthy(value),
        Item::Undefined | Item::Regex(_) | Item::Function(_) => false,
    }
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(values) => values.iter().any(json_truthy),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Deep equality where `1` and `1.0` are the same number
pub(super) fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(k, v)| r.get(k).is_some_and(|other| json_equal(v, other)))
        }
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l
            .as_f64()
            .zip(r.as_f64())
            .and_then(|(l, r)| l.partial_cmp(&r))
            .ok_or_else(|| EvalError::TypeMismatch("numbers are not comparable".to_string())),
        (Value::String(l), Value::String(r)) => Ok(l.cmp(r)),
        _ => Err(EvalError::TypeMismatch(
            "only numbers or strings can be ordered".to_string(),
        )),
    }
}

/// `$string` semantics; undefined becomes the empty string
pub(super) fn stringify(item: &Item<'_>) -> Result<String, EvalError> {
    match item {
        Item::Undefined => Ok(String::new()),
        Item::Json(Value::String(s)) => Ok(s.clone()),
        Item::Json(Value::Number(n)) => Ok(number_to_string(n)),
        Item::Json(other) => serde_json::to_string(other)
            .map_err(|e| EvalError::TypeMismatch(format!("cannot stringify value: {}", e))),
        Item::Regex(_) | Item::Function(_) => Ok(String::new()),
    }
}
