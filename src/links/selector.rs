//! Selectors and the values they extract
//!
//! A selector string carries a mandatory scheme prefix that picks the
//! evaluator: `jsonpath:` for plain paths, `jsonata:` for the expression
//! subset. Whatever the evaluator returns is normalized into
//! [`ExtractedValues`] so that matching only ever compares strings or
//! string mappings.

use super::expression::ExpressionSelector;
use super::path::PathSelector;
use super::{LinkError, LinkResult};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const JSONPATH_SCHEME: &str = "jsonpath:";
pub const JSONATA_SCHEME: &str = "jsonata:";

/// A compiled selector
#[derive(Debug, Clone)]
pub enum Selector {
    Path(PathSelector),
    Expression(ExpressionSelector),
}

impl Selector {
    /// Parse and compile a prefixed selector string
    ///
    /// Unknown prefixes and malformed bodies are configuration errors.
    pub fn parse(raw: &str) -> LinkResult<Self> {
        let trimmed = raw.trim();
        if let Some(path) = trimmed.strip_prefix(JSONPATH_SCHEME) {
            return Ok(Selector::Path(PathSelector::compile(path.trim())?));
        }
        if let Some(expression) = trimmed.strip_prefix(JSONATA_SCHEME) {
            return Ok(Selector::Expression(ExpressionSelector::compile(
                expression.trim(),
            )?));
        }
        Err(LinkError::UnknownScheme(raw.to_string()))
    }

    /// Extract values from an object; never fails, misses are empty
    pub fn evaluate(&self, object: &Value) -> ExtractedValues {
        match self {
            Selector::Path(path) => path.evaluate(object),
            Selector::Expression(expression) => expression.evaluate(object),
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Selector::Path(_) => JSONPATH_SCHEME,
            Selector::Expression(_) => JSONATA_SCHEME,
        }
    }

    /// Selector body without the scheme prefix
    pub fn body(&self) -> &str {
        match self {
            Selector::Path(path) => path.as_str(),
            Selector::Expression(expression) => expression.as_str(),
        }
    }
}

impl FromStr for Selector {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.scheme(), self.body())
    }
}

/// Values extracted by a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedValues {
    /// Zero or more scalar values, stringified
    Scalars(Vec<String>),
    /// A single mapping (label selector style)
    Mapping(BTreeMap<String, String>),
}

impl ExtractedValues {
    pub fn empty() -> Self {
        ExtractedValues::Scalars(Vec::new())
    }

    /// Normalize raw evaluator output
    ///
    /// A lone mapping stays a mapping. Everything else is flattened into
    /// strings; nulls and nested mappings are dropped.
    pub fn from_values<'v, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'v Value>,
    {
        let values: Vec<&Value> = values.into_iter().collect();

        if let [Value::Object(map)] = values.as_slice() {
            return ExtractedValues::Mapping(
                map.iter()
                    .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
                    .collect(),
            );
        }

        let mut scalars = Vec::new();
        for value in values {
            flatten_scalars(value, &mut scalars);
        }
        ExtractedValues::Scalars(scalars)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ExtractedValues::Scalars(values) => values.is_empty(),
            ExtractedValues::Mapping(map) => map.is_empty(),
        }
    }
}

fn flatten_scalars(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_scalars(item, out);
            }
        }
        other => {
            if let Some(s) = scalar_to_string(other) {
                out.push(s);
            }
        }
    }
}

/// Stringify strings, numbers and booleans
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_to_string(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Integral floats print without a fractional part (`3`, not `3.0`)
pub(crate) fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
