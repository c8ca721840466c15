//! Compiled link rules

use super::matching::values_match;
use super::models::{Direction, MatchType, Role, SpecLink, SpecLinkMatcher};
use super::selector::{ExtractedValues, Selector};
use super::{LinkError, LinkResult};
use crate::kube::KubernetesObject;

/// A matcher with both selectors compiled
#[derive(Debug, Clone)]
pub struct Matcher {
    source: Selector,
    target: Selector,
    match_type: MatchType,
}

impl Matcher {
    pub fn compile(definition: &SpecLinkMatcher) -> LinkResult<Self> {
        Ok(Self {
            source: Selector::parse(&definition.source_selector)?,
            target: Selector::parse(&definition.target_selector)?,
            match_type: definition.match_type,
        })
    }

    pub fn source_selector(&self) -> &Selector {
        &self.source
    }

    pub fn target_selector(&self) -> &Selector {
        &self.target
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    /// `Role::Source` is the `sourceSelector`, `Role::Target` the `targetSelector`
    pub fn selector(&self, side: Role) -> &Selector {
        match side {
            Role::Source => &self.source,
            Role::Target => &self.target,
        }
    }
}

/// A validated rule ready for resolution
#[derive(Debug, Clone)]
pub struct LinkRule {
    id: String,
    definition: SpecLink,
    matchers: Vec<Matcher>,
}

impl LinkRule {
    /// Validate a definition and compile its selectors
    pub fn compile(definition: SpecLink) -> LinkResult<Self> {
        let id = definition.id();
        let invalid = |reason: &str| LinkError::InvalidRule {
            rule: id.clone(),
            reason: reason.to_string(),
        };

        if definition.source_kind.trim().is_empty() {
            return Err(invalid("sourceKind is empty"));
        }
        if definition.target_kind.trim().is_empty() {
            return Err(invalid("targetKind is empty"));
        }
        if definition.matchers.is_empty() {
            return Err(invalid("at least one matcher is required"));
        }
        if definition.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(invalid("name must not be blank"));
        }

        let matchers = definition
            .matchers
            .iter()
            .map(Matcher::compile)
            .collect::<LinkResult<Vec<_>>>()?;

        Ok(Self {
            id,
            definition,
            matchers,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the definition carried an explicit name
    pub fn is_named(&self) -> bool {
        self.definition.name.is_some()
    }

    pub fn direction(&self) -> Direction {
        self.definition.direction
    }

    pub fn source_kind(&self) -> &str {
        &self.definition.source_kind
    }

    pub fn target_kind(&self) -> &str {
        &self.definition.target_kind
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn applies_to(&self, kind: &str) -> bool {
        self.source_kind() == kind || self.target_kind() == kind
    }

    /// Role an object of `kind` plays; the source side wins for same-kind rules
    pub fn role_of(&self, kind: &str) -> Option<Role> {
        if self.source_kind() == kind {
            Some(Role::Source)
        } else if self.target_kind() == kind {
            Some(Role::Target)
        } else {
            None
        }
    }

    pub fn kind_for(&self, role: Role) -> &str {
        match role {
            Role::Source => self.source_kind(),
            Role::Target => self.target_kind(),
        }
    }

    pub fn is_same_kind(&self) -> bool {
        self.source_kind() == self.target_kind()
    }

    /// Which selector reads objects sitting in `role`
    pub fn selector_side(&self, role: Role) -> Role {
        match self.direction() {
            Direction::SourceTarget => role,
            Direction::TargetSource => role.opposite(),
        }
    }

    /// Extract a matcher's values from an object occupying `role`
    pub fn extract(
        &self,
        matcher: &Matcher,
        role: Role,
        object: &KubernetesObject,
    ) -> ExtractedValues {
        matcher
            .selector(self.selector_side(role))
            .evaluate(object.manifest())
    }

    /// Compare values taken from the source-kind and target-kind objects
    ///
    /// Values read by the `sourceSelector` are always the left-hand side of
    /// the comparison, whichever object they came from.
    pub fn compare(
        &self,
        matcher: &Matcher,
        source_object_values: &ExtractedValues,
        target_object_values: &ExtractedValues,
    ) -> bool {
        match self.direction() {
            Direction::SourceTarget => values_match(
                source_object_values,
                target_object_values,
                matcher.match_type(),
            ),
            Direction::TargetSource => values_match(
                target_object_values,
                source_object_values,
                matcher.match_type(),
            ),
        }
    }

    /// Values of every matcher, in matcher order, for an object in `role`
    pub fn extract_all(&self, role: Role, object: &KubernetesObject) -> Vec<ExtractedValues> {
        self.matchers
            .iter()
            .map(|matcher| self.extract(matcher, role, object))
            .collect()
    }

    /// Check every matcher against values from a (source-kind, target-kind) pair
    ///
    /// Both slices come from [`LinkRule::extract_all`] and are indexed by matcher.
    pub fn matches_values(
        &self,
        source_object_values: &[ExtractedValues],
        target_object_values: &[ExtractedValues],
    ) -> bool {
        self.matchers
            .iter()
            .zip(source_object_values.iter().zip(target_object_values))
            .enumerate()
            .all(|(idx, (matcher, (source, target)))| {
                let matched = self.compare(matcher, source, target);
                if !matched {
                    tracing::trace!(rule = %self.id, matcher = idx, "Matcher failed");
                }
                matched
            })
    }
}

impl TryFrom<SpecLink> for LinkRule {
    type Error = LinkError;

    fn try_from(definition: SpecLink) -> Result<Self, Self::Error> {
        Self::compile(definition)
    }
}
