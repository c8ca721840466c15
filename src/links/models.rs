//! Rule definitions and resolution results

use super::rule::LinkRule;
use crate::kube::KubernetesObject;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind-side of a rule feeds the `sourceSelector`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Objects of `sourceKind` are evaluated with `sourceSelector`
    #[default]
    SourceTarget,
    /// Objects of `sourceKind` are evaluated with `targetSelector`
    TargetSource,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::SourceTarget => write!(f, "sourceTarget"),
            Direction::TargetSource => write!(f, "targetSource"),
        }
    }
}

/// Comparison applied to the values extracted by a matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Value-set or mapping equality
    Exact,
    /// Source values (or key/value pairs) contained in the target ones
    Subset,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Exact => write!(f, "exact"),
            MatchType::Subset => write!(f, "subset"),
        }
    }
}

/// Side of a rule an object sits on, by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// The object's kind is the rule's `sourceKind`
    Source,
    /// The object's kind is the rule's `targetKind`
    Target,
}

impl Role {
    pub fn opposite(self) -> Role {
        match self {
            Role::Source => Role::Target,
            Role::Target => Role::Source,
        }
    }
}

/// A relationship rule as written in the rule table or a rule file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecLink {
    /// Optional explicit identifier; defaults to `Source->Target`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub direction: Direction,

    pub source_kind: String,

    pub target_kind: String,

    /// All matchers must succeed for a link to exist
    pub matchers: Vec<SpecLinkMatcher>,
}

impl SpecLink {
    /// Rule identifier used for display and for disabling rules in config
    pub fn id(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}->{}", self.source_kind, self.target_kind))
    }
}

/// One selector pair plus its comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecLinkMatcher {
    pub source_selector: String,
    pub target_selector: String,
    pub match_type: MatchType,
}

/// A confirmed relationship between two concrete objects
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLink<'a> {
    pub rule: &'a LinkRule,
    /// The object of the rule's `sourceKind`
    pub source: &'a KubernetesObject,
    /// The object of the rule's `targetKind`
    pub target: &'a KubernetesObject,
    /// Side the focal object occupied; `None` for whole-pool resolution
    pub focal_role: Option<Role>,
}

impl<'a> ResolvedLink<'a> {
    /// The object on the other side from the focal object
    pub fn counterpart(&self) -> Option<&'a KubernetesObject> {
        self.focal_role.map(|role| match role {
            Role::Source => self.target,
            Role::Target => self.source,
        })
    }

    pub fn to_record(&self) -> LinkRecord {
        LinkRecord {
            rule: self.rule.id().to_string(),
            direction: self.rule.direction(),
            source_kind: self.source.kind().to_string(),
            source_name: self.source.name().to_string(),
            source_namespace: self.source.namespace().map(str::to_string),
            target_kind: self.target.kind().to_string(),
            target_name: self.target.name().to_string(),
            target_namespace: self.target.namespace().map(str::to_string),
        }
    }
}

impl PartialEq for ResolvedLink<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.rule, other.rule)
            && self.source.same_identity(other.source)
            && self.target.same_identity(other.target)
            && self.focal_role == other.focal_role
    }
}

/// Owned, serializable view of a link for output and IPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub rule: String,
    pub direction: Direction,
    pub source_kind: String,
    pub source_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_namespace: Option<String>,
    pub target_kind: String,
    pub target_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
}

impl LinkRecord {
    pub fn source_ref(&self) -> String {
        object_ref(&self.source_kind, self.source_namespace.as_deref(), &self.source_name)
    }

    pub fn target_ref(&self) -> String {
        object_ref(&self.target_kind, self.target_namespace.as_deref(), &self.target_name)
    }
}

fn object_ref(kind: &str, namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{}/{}/{}", kind, ns, name),
        None => format!("{}/{}", kind, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_link_deserialize_camel_case() {
        let yaml = r#"
direction: targetSource
sourceKind: Ingress
targetKind: Service
matchers:
  - sourceSelector: "jsonpath:$.metadata.name"
    targetSelector: "jsonpath:$.spec.rules.*.http.paths.*.backend.service.name"
    matchType: subset
"#;
        let link: SpecLink = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(link.direction, Direction::TargetSource);
        assert_eq!(link.matchers[0].match_type, MatchType::Subset);
        assert_eq!(link.id(), "Ingress->Service");
    }

    #[test]
    fn test_direction_defaults_to_source_target() {
        let yaml = "sourceKind: A\ntargetKind: B\nname: custom\nmatchers: []\n";
        let link: SpecLink = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(link.direction, Direction::SourceTarget);
        assert_eq!(link.id(), "custom");
    }

    #[test]
    fn test_unknown_match_type_rejected() {
        let yaml = r#"
sourceKind: A
targetKind: B
matchers:
  - sourceSelector: "jsonpath:$.a"
    targetSelector: "jsonpath:$.b"
    matchType: fuzzy
"#;
        assert!(serde_yaml::from_str::<SpecLink>(yaml).is_err());
    }

    #[test]
    fn test_role_opposite() {
        assert_eq!(Role::Source.opposite(), Role::Target);
        assert_eq!(Role::Target.opposite(), Role::Source);
    }

    #[test]
    fn test_record_refs() {
        let record = LinkRecord {
            rule: "Service->Deployment".to_string(),
            direction: Direction::SourceTarget,
            source_kind: "Service".to_string(),
            source_name: "web".to_string(),
            source_namespace: Some("prod".to_string()),
            target_kind: "Node".to_string(),
            target_name: "n1".to_string(),
            target_namespace: None,
        };
        assert_eq!(record.source_ref(), "Service/prod/web");
        assert_eq!(record.target_ref(), "Node/n1");
    }
}
