//! Match type comparison
//!
//! `exact` and `subset` branch on the shape of the extracted values:
//! mappings compare key/value pairs (label selector semantics), scalars
//! compare value sets. Mixed shapes never match, and neither does an empty
//! side: a selector that found nothing cannot establish a relationship.

use super::models::MatchType;
use super::selector::ExtractedValues;
use std::collections::BTreeSet;

/// Compare values from the source selector against the target selector
pub fn values_match(
    source: &ExtractedValues,
    target: &ExtractedValues,
    match_type: MatchType,
) -> bool {
    if source.is_empty() || target.is_empty() {
        return false;
    }

    match (source, target) {
        (ExtractedValues::Mapping(source), ExtractedValues::Mapping(target)) => match match_type {
            MatchType::Exact => source == target,
            MatchType::Subset => source.iter().all(|(k, v)| target.get(k) == Some(v)),
        },
        (ExtractedValues::Scalars(source), ExtractedValues::Scalars(target)) => {
            let source: BTreeSet<&str> = source.iter().map(String::as_str).collect();
            let target: BTreeSet<&str> = target.iter().map(String::as_str).collect();
            match match_type {
                MatchType::Exact => source == target,
                MatchType::Subset => source.is_subset(&target),
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn mapping(pairs: &[(&str, &str)]) -> ExtractedValues {
        ExtractedValues::Mapping(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn scalars(values: &[&str]) -> ExtractedValues {
        ExtractedValues::Scalars(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_mapping_subset_vs_exact() {
        let source = mapping(&[("app", "x")]);
        let target = mapping(&[("app", "x"), ("tier", "web")]);

        assert!(values_match(&source, &target, MatchType::Subset));
        assert!(!values_match(&source, &target, MatchType::Exact));
        assert!(values_match(&target, &target, MatchType::Exact));
    }

    #[test]
    fn test_mapping_subset_requires_equal_values() {
        let source = mapping(&[("app", "x")]);
        let target = mapping(&[("app", "y"), ("tier", "web")]);
        assert!(!values_match(&source, &target, MatchType::Subset));
    }

    #[test]
    fn test_scalar_exact_is_set_equality() {
        assert!(values_match(&scalars(&["a"]), &scalars(&["a", "a"]), MatchType::Exact));
        assert!(values_match(&scalars(&["a", "b"]), &scalars(&["b", "a"]), MatchType::Exact));
        assert!(!values_match(&scalars(&["a"]), &scalars(&["a", "b"]), MatchType::Exact));
    }

    #[test]
    fn test_scalar_subset() {
        assert!(values_match(&scalars(&["a"]), &scalars(&["a", "b"]), MatchType::Subset));
        assert!(!values_match(&scalars(&["a", "c"]), &scalars(&["a", "b"]), MatchType::Subset));
    }

    #[test]
    fn test_empty_never_matches() {
        assert!(!values_match(&scalars(&[]), &scalars(&[]), MatchType::Exact));
        assert!(!values_match(&scalars(&[]), &scalars(&["a"]), MatchType::Subset));
        assert!(!values_match(&mapping(&[]), &mapping(&[("a", "b")]), MatchType::Subset));
    }

    #[test]
    fn test_mixed_shapes_never_match() {
        let source = mapping(&[("app", "x")]);
        assert!(!values_match(&source, &scalars(&["x"]), MatchType::Subset));
        assert!(!values_match(&scalars(&["x"]), &source, MatchType::Exact));
    }
}
