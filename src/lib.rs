//! kubelinks library
//!
//! Discovers relationships between Kubernetes objects from declarative link
//! rules. A rule pairs two kinds and a list of matchers; each matcher reads a
//! value from both objects through a `jsonpath:` or `jsonata:` selector and
//! compares the results. The library is used both by the `kubelinks` binary
//! and directly by the integration tests.

pub mod cli;
pub mod config;
pub mod kube;
pub mod links;
pub mod output;

// Re-export commonly used types for convenience
pub use kube::{KubernetesObject, ObjectSource};
pub use links::{LinkRegistry, LinkResolver, LinkRule, ResolvedLink, Selector, resolve_links};
