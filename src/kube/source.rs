//! Object sources
//!
//! Sources materialize the object pool the linker works on. The linker itself
//! does no I/O; whatever fetched the objects (kubectl, an API bridge, files on
//! disk) only has to implement [`ObjectSource`].

use super::object::KubernetesObject;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Anything that can produce a snapshot of Kubernetes objects
#[cfg_attr(test, mockall::automock)]
pub trait ObjectSource {
    /// Return the current snapshot, in a stable order
    fn objects(&self) -> Result<Vec<KubernetesObject>>;
}

/// In-memory source, mostly useful for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    objects: Vec<KubernetesObject>,
}

impl StaticSource {
    pub fn new(objects: Vec<KubernetesObject>) -> Self {
        Self { objects }
    }
}

impl ObjectSource for StaticSource {
    fn objects(&self) -> Result<Vec<KubernetesObject>> {
        Ok(self.objects.clone())
    }
}

/// Reads manifests from files, directories or stdin (`-`)
///
/// Accepts the output of `kubectl get -o yaml|json`: multi-document YAML,
/// single JSON objects, and `List` documents whose items are flattened.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    paths: Vec<PathBuf>,
}

impl ManifestSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    fn read_path(&self, path: &Path, objects: &mut Vec<KubernetesObject>) -> Result<()> {
        if path == Path::new("-") {
            let mut contents = String::new();
            std::io::stdin()
                .read_to_string(&mut contents)
                .context("Failed to read manifests from stdin")?;
            objects.extend(parse_manifests(&contents).context("Failed to parse stdin")?);
            return Ok(());
        }

        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("Failed to read directory: {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_manifest_file(p))
                .collect();
            // read_dir order is platform dependent
            entries.sort();
            for entry in entries {
                self.read_path(&entry, objects)?;
            }
            return Ok(());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;
        let parsed = parse_manifests(&contents)
            .with_context(|| format!("Failed to parse manifest file: {}", path.display()))?;
        tracing::debug!("Loaded {} objects from {}", parsed.len(), path.display());
        objects.extend(parsed);
        Ok(())
    }
}

impl ObjectSource for ManifestSource {
    fn objects(&self) -> Result<Vec<KubernetesObject>> {
        let mut objects = Vec::new();
        for path in &self.paths {
            self.read_path(path, &mut objects)?;
        }
        Ok(objects)
    }
}

fn is_manifest_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml") | Some("json")
    )
}

/// Parse a (possibly multi-document) YAML or JSON string into objects
pub fn parse_manifests(contents: &str) -> Result<Vec<KubernetesObject>> {
    let mut objects = Vec::new();

    for (idx, document) in serde_yaml::Deserializer::from_str(contents).enumerate() {
        let value = Value::deserialize(document)
            .with_context(|| format!("Invalid manifest document #{}", idx + 1))?;
        if value.is_null() {
            continue;
        }
        push_document(value, &mut objects);
    }

    Ok(objects)
}

/// Add a document, flattening `List` and typed `*List` wrappers
fn push_document(value: Value, objects: &mut Vec<KubernetesObject>) {
    let kind = value
        .get("kind")
        .and_then(|k| k.as_str())
        .map(str::to_string);

    if let (Some(kind), Some(items)) = (
        kind.as_deref(),
        value.get("items").and_then(|i| i.as_array()),
    ) {
        if kind.ends_with("List") {
            // Typed lists from the API (DeploymentList) omit kind on their items
            let item_kind = kind.trim_end_matches("List");
            for item in items {
                let mut item = item.clone();
                if item.get("kind").is_none() && !item_kind.is_empty() {
                    if let Some(map) = item.as_object_mut() {
                        map.insert("kind".to_string(), Value::String(item_kind.to_string()));
                    }
                }
                push_document(item, objects);
            }
            return;
        }
    }

    match KubernetesObject::new(value) {
        Ok(object) => objects.push(object),
        Err(e) => tracing::warn!("Skipping manifest document: {}", e),
    }
}

/// Concatenate the objects of several sources, dropping duplicates by key
///
/// The first occurrence of an object wins and input order is preserved.
pub fn collect_pool(sources: &[&dyn ObjectSource]) -> Result<Vec<KubernetesObject>> {
    let mut seen = HashSet::new();
    let mut pool = Vec::new();

    for source in sources {
        for object in source.objects()? {
            if seen.insert(object.key()) {
                pool.push(object);
            } else {
                tracing::debug!("Dropping duplicate object {}", object.key());
            }
        }
    }

    Ok(pool)
}

/// Find a focal object by kind (case-insensitive), namespace and name
pub fn find_object<'a>(
    pool: &'a [KubernetesObject],
    kind: &str,
    namespace: Option<&str>,
    name: &str,
) -> Option<&'a KubernetesObject> {
    pool.iter().find(|object| {
        object.kind().eq_ignore_ascii_case(kind)
            && object.name() == name
            && namespace.is_none_or(|ns| object.namespace() == Some(ns))
    })
}
