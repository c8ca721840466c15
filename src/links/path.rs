//! `jsonpath:` selectors
//!
//! Evaluated with `jsonpath-rust` (RFC 9535 syntax). A path is validated once
//! when the rule is compiled; at evaluation time a miss is simply an empty
//! result.

use super::selector::ExtractedValues;
use super::{LinkError, LinkResult};
use jsonpath_rust::JsonPath;
use serde_json::Value;

/// A validated JSONPath expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSelector {
    path: String,
}

impl PathSelector {
    /// Validate a path expression
    ///
    /// jsonpath-rust parses on every query, so validation runs the path once
    /// against `null` and only keeps the parse outcome.
    pub fn compile(path: &str) -> LinkResult<Self> {
        if path.is_empty() {
            return Err(LinkError::InvalidPath {
                path: path.to_string(),
                reason: "path is empty".to_string(),
            });
        }

        Value::Null
            .query(path)
            .map_err(|e| LinkError::InvalidPath {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            path: path.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Resolve the path against an object
    ///
    /// Wildcards expand to every reachable value; branches missing the
    /// remaining segments contribute nothing.
    pub fn evaluate(&self, object: &Value) -> ExtractedValues {
        match object.query(&self.path) {
            Ok(values) => ExtractedValues::from_values(values),
            Err(e) => {
                tracing::debug!("JSONPath '{}' failed: {}", self.path, e);
                ExtractedValues::empty()
            }
        }
    }
}
