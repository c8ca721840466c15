//! Rule registry
//!
//! The built-in rules live in the `BUILTIN_LINKS` table below. To add a new
//! relationship, append an entry; order matters because resolution output is
//! grouped by rule in registry order.
//!
//! A registry is immutable once built. Derived registries (rules disabled by
//! config, user rule files appended) are new values built with
//! [`LinkRegistry::without`] and [`LinkRegistry::extend`].

use super::models::{Direction, MatchType, SpecLink, SpecLinkMatcher};
use super::rule::LinkRule;
use super::{LinkError, LinkResult};
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

/// Registry entry for a built-in relationship
pub struct BuiltinLink {
    pub direction: Direction,
    pub source_kind: &'static str,
    pub target_kind: &'static str,
    /// `(sourceSelector, targetSelector, matchType)`
    pub matchers: &'static [(&'static str, &'static str, MatchType)],
}

/// Relationships between core workload resources
pub const BUILTIN_LINKS: &[BuiltinLink] = &[
    BuiltinLink {
        direction: Direction::SourceTarget,
        source_kind: "PodDisruptionBudget",
        target_kind: "Deployment",
        matchers: &[(
            "jsonpath:$.spec.selector.matchLabels",
            "jsonpath:$.spec.template.metadata.labels",
            MatchType::Subset,
        )],
    },
    BuiltinLink {
        direction: Direction::SourceTarget,
        source_kind: "Service",
        target_kind: "Deployment",
        matchers: &[(
            "jsonpath:$.spec.selector",
            "jsonpath:$.spec.template.metadata.labels",
            MatchType::Subset,
        )],
    },
    BuiltinLink {
        direction: Direction::SourceTarget,
        source_kind: "ConfigMap",
        target_kind: "Deployment",
        matchers: &[(
            "jsonpath:$.metadata.name",
            "jsonpath:$.spec.template.spec.volumes.*.configMap.name",
            MatchType::Exact,
        )],
    },
    BuiltinLink {
        direction: Direction::SourceTarget,
        source_kind: "ServiceAccount",
        target_kind: "Deployment",
        matchers: &[(
            "jsonpath:$.metadata.name",
            "jsonpath:$.spec.template.spec.serviceAccountName",
            MatchType::Exact,
        )],
    },
    BuiltinLink {
        direction: Direction::SourceTarget,
        source_kind: "Secret",
        target_kind: "Deployment",
        matchers: &[
            (
                "jsonpath:$.metadata.name",
                "jsonpath:$.spec.template.spec.containers.*.env.*.valueFrom.secretKeyRef.name",
                MatchType::Exact,
            ),
            (
                "jsonpath:$.metadata.name",
                "jsonpath:$.spec.template.spec.containers.*.envFrom.*.secretRef.name",
                MatchType::Exact,
            ),
            (
                "jsonpath:$.metadata.name",
                "jsonpath:$.spec.template.spec.volumes.*.secret.secretName",
                MatchType::Exact,
            ),
        ],
    },
    BuiltinLink {
        direction: Direction::SourceTarget,
        source_kind: "HorizontalPodAutoscaler",
        target_kind: "Deployment",
        matchers: &[(
            "jsonata:[$.spec.scaleTargetRef[kind = 'Deployment'].name]",
            "jsonpath:$.metadata.name",
            MatchType::Exact,
        )],
    },
    BuiltinLink {
        direction: Direction::SourceTarget,
        source_kind: "Endpoints",
        target_kind: "Service",
        matchers: &[(
            "jsonpath:$.metadata.name",
            "jsonpath:$.metadata.name",
            MatchType::Exact,
        )],
    },
    BuiltinLink {
        direction: Direction::SourceTarget,
        source_kind: "VirtualService",
        target_kind: "Service",
        matchers: &[(
            r#"jsonata:[$.spec.http.route.destination.host ~> function($host) {$map($host, function($h) {$match($h, /cluster\.local/) ? $split($h, ".")[0] : $h})}]"#,
            "jsonpath:$.metadata.name",
            MatchType::Exact,
        )],
    },
];

impl BuiltinLink {
    pub fn to_spec(&self) -> SpecLink {
        SpecLink {
            name: None,
            direction: self.direction,
            source_kind: self.source_kind.to_string(),
            target_kind: self.target_kind.to_string(),
            matchers: self
                .matchers
                .iter()
                .map(|(source, target, match_type)| SpecLinkMatcher {
                    source_selector: source.to_string(),
                    target_selector: target.to_string(),
                    match_type: *match_type,
                })
                .collect(),
        }
    }
}

/// Definitions of every built-in rule, in registry order
pub fn builtin_links() -> Vec<SpecLink> {
    BUILTIN_LINKS.iter().map(BuiltinLink::to_spec).collect()
}

static BUILTIN_REGISTRY: LazyLock<LinkRegistry> = LazyLock::new(|| {
    LinkRegistry::new(builtin_links()).expect("built-in link rules must compile")
});

/// Ordered, immutable collection of compiled rules
#[derive(Debug, Clone, Default)]
pub struct LinkRegistry {
    rules: Vec<LinkRule>,
}

impl LinkRegistry {
    /// Compile rule definitions, failing on the first invalid one
    pub fn new<I>(definitions: I) -> LinkResult<Self>
    where
        I: IntoIterator<Item = SpecLink>,
    {
        let mut registry = Self::default();
        for definition in definitions {
            registry.push(LinkRule::compile(definition)?)?;
        }
        Ok(registry)
    }

    /// The shared registry of built-in rules
    pub fn builtin() -> &'static LinkRegistry {
        &BUILTIN_REGISTRY
    }

    fn push(&mut self, rule: LinkRule) -> LinkResult<()> {
        if rule.is_named() && self.get(rule.id()).is_some() {
            return Err(LinkError::DuplicateRule(rule.id().to_string()));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[LinkRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule with the given id
    pub fn get(&self, id: &str) -> Option<&LinkRule> {
        self.rules.iter().find(|rule| rule.id() == id)
    }

    /// Rules where either side is `kind`, in registry order
    pub fn rules_for_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a LinkRule> + 'a {
        self.rules.iter().filter(move |rule| rule.applies_to(kind))
    }

    /// Every kind mentioned by any rule, sorted
    pub fn kinds(&self) -> Vec<&str> {
        self.rules
            .iter()
            .flat_map(|rule| [rule.source_kind(), rule.target_kind()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `(sourceKind, targetKind)` for each rule, in registry order
    pub fn kind_pairs(&self) -> Vec<(&str, &str)> {
        self.rules
            .iter()
            .map(|rule| (rule.source_kind(), rule.target_kind()))
            .collect()
    }

    /// Kinds on the other side of any rule involving `kind`, sorted
    pub fn related_kinds(&self, kind: &str) -> Vec<&str> {
        let mut related = BTreeSet::new();
        for rule in &self.rules {
            if rule.source_kind() == kind {
                related.insert(rule.target_kind());
            }
            if rule.target_kind() == kind {
                related.insert(rule.source_kind());
            }
        }
        related.into_iter().collect()
    }

    pub fn supports_kind(&self, kind: &str) -> bool {
        self.rules.iter().any(|rule| rule.applies_to(kind))
    }

    /// A copy without the rules whose ids are listed
    pub fn without<S: AsRef<str>>(&self, ids: &[S]) -> LinkRegistry {
        let disabled: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        LinkRegistry {
            rules: self
                .rules
                .iter()
                .filter(|rule| !disabled.contains(rule.id()))
                .cloned()
                .collect(),
        }
    }

    /// A copy with more rules appended
    pub fn extend<I>(&self, definitions: I) -> LinkResult<LinkRegistry>
    where
        I: IntoIterator<Item = SpecLink>,
    {
        let mut registry = self.clone();
        for definition in definitions {
            registry.push(LinkRule::compile(definition)?)?;
        }
        Ok(registry)
    }
}
