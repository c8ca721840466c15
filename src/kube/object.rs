//! Kubernetes object snapshots
//!
//! The linker never talks to a cluster. It works on plain JSON snapshots of
//! objects that some collaborator already fetched (kubectl output, an API
//! bridge, test fixtures). `KubernetesObject` is a thin read-only wrapper that
//! guarantees a `kind` and offers the conventional metadata accessors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Object validation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ObjectError {
    #[error("Object is not a JSON mapping")]
    NotAMapping,

    #[error("Object has no kind")]
    MissingKind,
}

/// A snapshot of a single Kubernetes object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct KubernetesObject {
    manifest: Value,
}

impl KubernetesObject {
    /// Wrap a manifest, rejecting values without a string `kind`
    pub fn new(manifest: Value) -> Result<Self, ObjectError> {
        let map = manifest.as_object().ok_or(ObjectError::NotAMapping)?;
        match map.get("kind").and_then(|k| k.as_str()) {
            Some(kind) if !kind.is_empty() => Ok(Self { manifest }),
            _ => Err(ObjectError::MissingKind),
        }
    }

    /// Resource kind (e.g. "Deployment")
    pub fn kind(&self) -> &str {
        self.manifest
            .get("kind")
            .and_then(|k| k.as_str())
            .unwrap_or_default()
    }

    /// `metadata.name`, empty when absent
    pub fn name(&self) -> &str {
        self.metadata_str("name").unwrap_or_default()
    }

    /// `metadata.namespace`, `None` for cluster-scoped objects
    pub fn namespace(&self) -> Option<&str> {
        self.metadata_str("namespace").filter(|ns| !ns.is_empty())
    }

    pub fn api_version(&self) -> Option<&str> {
        self.manifest.get("apiVersion").and_then(|v| v.as_str())
    }

    /// String-valued entries of `metadata.labels`
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.manifest
            .get("metadata")
            .and_then(|m| m.get("labels"))
            .and_then(|l| l.as_object())
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The raw manifest that selectors traverse
    pub fn manifest(&self) -> &Value {
        &self.manifest
    }

    /// Stable identity key: `Kind/namespace/name`, or `Kind/name` when cluster-scoped
    pub fn key(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}/{}/{}", self.kind(), ns, self.name()),
            None => format!("{}/{}", self.kind(), self.name()),
        }
    }

    /// Same kind, namespace and name
    pub fn same_identity(&self, other: &KubernetesObject) -> bool {
        self.kind() == other.kind()
            && self.namespace() == other.namespace()
            && self.name() == other.name()
    }

    fn metadata_str(&self, field: &str) -> Option<&str> {
        self.manifest
            .get("metadata")
            .and_then(|m| m.get(field))
            .and_then(|v| v.as_str())
    }
}

impl TryFrom<Value> for KubernetesObject {
    type Error = ObjectError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KubernetesObject> for Value {
    fn from(object: KubernetesObject) -> Self {
        object.manifest
    }
}

impl fmt::Display for KubernetesObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
