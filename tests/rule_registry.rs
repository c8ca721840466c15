//! Rule registry tests
//!
//! Built-in rule table, rule validation and rule files on disk.

use kubelinks::links::registry::{BUILTIN_LINKS, builtin_links};
use kubelinks::links::{
    Direction, LinkError, LinkRegistry, LinkRule, MatchType, RuleLoader, SpecLink,
    SpecLinkMatcher,
};

fn rule(source_kind: &str, target_kind: &str, source: &str, target: &str) -> SpecLink {
    SpecLink {
        name: None,
        direction: Direction::SourceTarget,
        source_kind: source_kind.to_string(),
        target_kind: target_kind.to_string(),
        matchers: vec![SpecLinkMatcher {
            source_selector: source.to_string(),
            target_selector: target.to_string(),
            match_type: MatchType::Exact,
        }],
    }
}

#[test]
fn test_builtin_kinds() {
    let registry = LinkRegistry::builtin();
    assert_eq!(
        registry.kinds(),
        vec![
            "ConfigMap",
            "Deployment",
            "Endpoints",
            "HorizontalPodAutoscaler",
            "PodDisruptionBudget",
            "Secret",
            "Service",
            "ServiceAccount",
            "VirtualService",
        ]
    );
    assert_eq!(
        registry.kind_pairs().last(),
        Some(&("VirtualService", "Service"))
    );
    assert_eq!(registry.related_kinds("Deployment").len(), 6);
}

#[test]
fn test_builtin_definitions_match_table() {
    let definitions = builtin_links();
    assert_eq!(definitions.len(), BUILTIN_LINKS.len());

    let secret = definitions
        .iter()
        .find(|d| d.source_kind == "Secret")
        .unwrap();
    assert_eq!(secret.matchers.len(), 3);
    assert!(
        secret
            .matchers
            .iter()
            .all(|m| m.match_type == MatchType::Exact)
    );

    let service = LinkRegistry::builtin().get("Service->Deployment").unwrap();
    assert_eq!(service.matchers()[0].match_type(), MatchType::Subset);
    assert_eq!(
        service.matchers()[0].source_selector().to_string(),
        "jsonpath:$.spec.selector"
    );
}

#[test]
fn test_invalid_rules_rejected() {
    let bad_scheme = rule("A", "B", "$.metadata.name", "jsonpath:$.metadata.name");
    assert!(matches!(
        LinkRule::compile(bad_scheme),
        Err(LinkError::UnknownScheme(_))
    ));

    let empty_kind = rule("", "B", "jsonpath:$.a", "jsonpath:$.b");
    assert!(matches!(
        LinkRule::compile(empty_kind),
        Err(LinkError::InvalidRule { .. })
    ));

    let mut no_matchers = rule("A", "B", "jsonpath:$.a", "jsonpath:$.b");
    no_matchers.matchers.clear();
    let err = LinkRule::compile(no_matchers).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid rule 'A->B': at least one matcher is required"
    );

    let bad_expression = rule("A", "B", "jsonata:$frobnicate(a)", "jsonpath:$.b");
    assert!(LinkRegistry::new([bad_expression]).is_err());
}

#[test]
fn test_named_rules_must_be_unique() {
    let mut first = rule("A", "B", "jsonpath:$.a", "jsonpath:$.b");
    first.name = Some("a-to-b".to_string());
    let second = first.clone();

    assert_eq!(
        LinkRegistry::new([first, second]).unwrap_err(),
        LinkError::DuplicateRule("a-to-b".to_string())
    );

    // Unnamed rules may repeat a pair
    let unnamed = rule("A", "B", "jsonpath:$.a", "jsonpath:$.b");
    let registry = LinkRegistry::new([unnamed.clone(), unnamed]).unwrap();
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_rule_loader_reads_directory_in_order() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("20-ingress.yaml"),
        r#"
rules:
  - name: ingress-backend
    direction: targetSource
    sourceKind: Service
    targetKind: Ingress
    matchers:
      - sourceSelector: "jsonpath:$.spec.rules.*.http.paths.*.backend.service.name"
        targetSelector: "jsonpath:$.metadata.name"
        matchType: subset
"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("10-statefulset.yml"),
        r#"
rules:
  - sourceKind: Service
    targetKind: StatefulSet
    matchers:
      - sourceSelector: "jsonpath:$.spec.selector"
        targetSelector: "jsonpath:$.spec.template.metadata.labels"
        matchType: subset
"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a rule file").unwrap();

    let rules = RuleLoader::with_dir(dir.path().to_path_buf())
        .load_all()
        .unwrap();
    let ids: Vec<String> = rules.iter().map(SpecLink::id).collect();
    assert_eq!(ids, vec!["Service->StatefulSet", "ingress-backend"]);
    assert_eq!(rules[1].direction, Direction::TargetSource);

    let registry = LinkRegistry::builtin().extend(rules).unwrap();
    assert_eq!(registry.len(), 10);
    assert!(registry.supports_kind("Ingress"));
}

#[test]
fn test_rule_loader_missing_directory_is_empty() {
    let loader = RuleLoader::with_dir("/nonexistent/kubelinks/rules".into());
    assert!(loader.load_all().unwrap().is_empty());
}

#[test]
fn test_rule_loader_reports_bad_rule() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(
        &path,
        r#"
rules:
  - sourceKind: Ingress
    targetKind: Service
    matchers:
      - sourceSelector: "jsonata:spec.(rules"
        targetSelector: "jsonpath:$.metadata.name"
        matchType: exact
"#,
    )
    .unwrap();

    let err = RuleLoader::load_file(&path).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("broken.yaml"));
    assert!(message.contains("Rule #1 (Ingress->Service) is invalid"));
}

#[test]
fn test_rule_loader_rejects_unknown_fields() {
    let err = RuleLoader::parse("rulez: []").unwrap_err();
    assert!(format!("{:#}", err).contains("rulez"));

    let err = RuleLoader::parse(
        r#"
rules:
  - sourceKind: A
    targetKind: B
    matchers:
      - sourceSelector: "jsonpath:$.a"
        targetSelector: "jsonpath:$.b"
        matchType: fuzzy
"#,
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("fuzzy"));
}
