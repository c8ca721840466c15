//! Kubernetes object snapshots and the sources that produce them
//!
//! Nothing here talks to a cluster. Objects arrive as already-materialized
//! manifests (kubectl output, files, an in-process bridge) and are handed to
//! the linker as a plain slice.

pub mod object;
pub mod source;

pub use object::{KubernetesObject, ObjectError};
pub use source::{
    ManifestSource, ObjectSource, StaticSource, collect_pool, find_object, parse_manifests,
};
