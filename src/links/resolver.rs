//! Link resolution
//!
//! Given a focal object and a pool, every rule that mentions the focal kind
//! is applied against candidates of the complementary kind. The focal object
//! is evaluated once per matcher; candidates are evaluated with the opposite
//! selector. Output is grouped by rule in registry order, then by candidate
//! order in the pool.

use super::models::{ResolvedLink, Role};
use super::registry::LinkRegistry;
use super::rule::LinkRule;
use super::selector::ExtractedValues;
use crate::kube::KubernetesObject;

/// Links for `focal` using the built-in rules and default options
pub fn resolve_links<'a>(
    focal: &'a KubernetesObject,
    pool: &'a [KubernetesObject],
) -> Vec<ResolvedLink<'a>> {
    LinkResolver::new(LinkRegistry::builtin()).resolve(focal, pool)
}

/// Applies a registry to object pools
#[derive(Debug, Clone, Copy)]
pub struct LinkResolver<'r> {
    registry: &'r LinkRegistry,
    namespace_scoped: bool,
}

impl<'r> LinkResolver<'r> {
    pub fn new(registry: &'r LinkRegistry) -> Self {
        Self {
            registry,
            namespace_scoped: false,
        }
    }

    /// Only link objects that share a namespace
    ///
    /// Objects without a namespace (cluster-scoped) are never filtered out.
    pub fn namespace_scoped(mut self, enabled: bool) -> Self {
        self.namespace_scoped = enabled;
        self
    }

    /// Everything linked to `focal`
    pub fn resolve<'a>(
        &self,
        focal: &'a KubernetesObject,
        pool: &'a [KubernetesObject],
    ) -> Vec<ResolvedLink<'a>>
    where
        'r: 'a,
    {
        let mut links = Vec::new();

        for rule in self.registry.rules_for_kind(focal.kind()) {
            let roles: &[Role] = if rule.is_same_kind() {
                &[Role::Source, Role::Target]
            } else {
                match rule.role_of(focal.kind()) {
                    Some(Role::Source) => &[Role::Source],
                    Some(Role::Target) => &[Role::Target],
                    None => &[],
                }
            };

            for &role in roles {
                let before = links.len();
                self.resolve_role(rule, role, focal, pool, &mut links);
                tracing::debug!(
                    rule = rule.id(),
                    focal = %focal,
                    role = ?role,
                    links = links.len() - before,
                    "Applied link rule"
                );
            }
        }

        links
    }

    fn resolve_role<'a>(
        &self,
        rule: &'a LinkRule,
        role: Role,
        focal: &'a KubernetesObject,
        pool: &'a [KubernetesObject],
        links: &mut Vec<ResolvedLink<'a>>,
    ) {
        let focal_values = rule.extract_all(role, focal);

        if let Some(idx) = focal_values.iter().position(ExtractedValues::is_empty) {
            tracing::trace!(
                rule = rule.id(),
                focal = %focal,
                matcher = idx,
                "Focal object yields no values"
            );
            return;
        }

        let candidate_role = role.opposite();
        let candidate_kind = rule.kind_for(candidate_role);
        let focal_in_pool = pool.as_ptr_range().contains(&std::ptr::from_ref(focal));

        for candidate in pool.iter().filter(|o| o.kind() == candidate_kind) {
            // Pool members are told apart by address, so identical
            // kind/namespace/name pairs still link to each other
            let is_focal = if focal_in_pool {
                std::ptr::eq(candidate, focal)
            } else {
                candidate.same_identity(focal)
            };
            if is_focal || !self.namespace_allows(focal, candidate) {
                continue;
            }

            let candidate_values = rule.extract_all(candidate_role, candidate);
            let (source, target, matched) = match role {
                Role::Source => (
                    focal,
                    candidate,
                    rule.matches_values(&focal_values, &candidate_values),
                ),
                Role::Target => (
                    candidate,
                    focal,
                    rule.matches_values(&candidate_values, &focal_values),
                ),
            };

            if matched {
                links.push(ResolvedLink {
                    rule,
                    source,
                    target,
                    focal_role: Some(role),
                });
            } else {
                tracing::trace!(rule = rule.id(), candidate = %candidate, "Candidate rejected");
            }
        }
    }

    /// Every link in the pool
    ///
    /// Ordered by rule, then source object, then target object.
    pub fn resolve_all<'a>(&self, pool: &'a [KubernetesObject]) -> Vec<ResolvedLink<'a>>
    where
        'r: 'a,
    {
        let mut links = Vec::new();

        for rule in self.registry.rules() {
            let sources: Vec<&KubernetesObject> = pool
                .iter()
                .filter(|o| o.kind() == rule.source_kind())
                .collect();
            if sources.is_empty() {
                continue;
            }

            // Each target is evaluated once per matcher
            let targets: Vec<(&KubernetesObject, Vec<ExtractedValues>)> = pool
                .iter()
                .filter(|o| o.kind() == rule.target_kind())
                .map(|target| (target, rule.extract_all(Role::Target, target)))
                .collect();

            let before = links.len();
            for source in sources {
                let source_values = rule.extract_all(Role::Source, source);

                for (target, target_values) in &targets {
                    if std::ptr::eq(source, *target) || !self.namespace_allows(source, target) {
                        continue;
                    }
                    if rule.matches_values(&source_values, target_values) {
                        links.push(ResolvedLink {
                            rule,
                            source,
                            target: *target,
                            focal_role: None,
                        });
                    }
                }
            }

            tracing::debug!(
                rule = rule.id(),
                links = links.len() - before,
                "Applied link rule to pool"
            );
        }

        links
    }

    fn namespace_allows(&self, a: &KubernetesObject, b: &KubernetesObject) -> bool {
        if !self.namespace_scoped {
            return true;
        }
        match (a.namespace(), b.namespace()) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}
