//! Resource relationship linker
//!
//! Infers relationships between Kubernetes objects of different kinds from a
//! declarative rule table. Each rule names a source kind, a target kind and a
//! list of matchers; a matcher extracts values from both objects with a
//! selector (`jsonpath:` or `jsonata:`) and compares them.
//!
//! Resolution is pure: the rule registry is immutable and the object pool is
//! passed in explicitly, so links for different focal objects can be computed
//! concurrently.

pub mod expression;
pub mod loader;
pub mod matching;
pub mod models;
pub mod path;
pub mod registry;
pub mod resolver;
pub mod rule;
pub mod selector;

pub use loader::RuleLoader;
pub use matching::values_match;
pub use models::{Direction, LinkRecord, MatchType, ResolvedLink, Role, SpecLink, SpecLinkMatcher};
pub use registry::LinkRegistry;
pub use resolver::{LinkResolver, resolve_links};
pub use rule::{LinkRule, Matcher};
pub use selector::{ExtractedValues, Selector};

/// Rule definition errors
///
/// These only surface while a registry is being built. Resolution itself never
/// fails: anything that goes wrong while evaluating a selector just makes the
/// matcher miss.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("Unknown selector scheme in '{0}' (expected 'jsonpath:' or 'jsonata:')")]
    UnknownScheme(String),

    #[error("Invalid JSONPath '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("Duplicate rule name: {0}")]
    DuplicateRule(String),
}

/// Result type for rule construction
pub type LinkResult<T> = Result<T, LinkError>;
