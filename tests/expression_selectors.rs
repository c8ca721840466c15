//! Selector evaluation tests
//!
//! Exercises both selector schemes through the public `Selector` API and the
//! normalization of their results into `ExtractedValues`.

use kubelinks::Selector;
use kubelinks::links::{ExtractedValues, LinkError};
use serde_json::{Value, json};

fn deployment() -> Value {
    json!({
        "kind": "Deployment",
        "metadata": {"name": "web", "labels": {"app": "web", "replicas": 3}},
        "spec": {
            "template": {
                "spec": {
                    "containers": [
                        {"name": "app", "image": "registry.local/web:1.2", "ports": [{"containerPort": 8080}]},
                        {"name": "sidecar", "image": "envoy:1.30", "ports": [{"containerPort": 15001}]}
                    ]
                }
            }
        }
    })
}

fn scalars(values: &[&str]) -> ExtractedValues {
    ExtractedValues::Scalars(values.iter().map(|v| v.to_string()).collect())
}

fn extract(raw: &str, object: &Value) -> ExtractedValues {
    Selector::parse(raw).unwrap().evaluate(object)
}

#[test]
fn test_scheme_is_required() {
    assert!(matches!(
        Selector::parse("$.metadata.name"),
        Err(LinkError::UnknownScheme(_))
    ));
    assert!(matches!(
        Selector::parse("xpath:/metadata/name"),
        Err(LinkError::UnknownScheme(_))
    ));
}

#[test]
fn test_display_keeps_scheme() {
    let selector: Selector = "jsonpath:$.metadata.name".parse().unwrap();
    assert_eq!(selector.scheme(), "jsonpath:");
    assert_eq!(selector.body(), "$.metadata.name");
    assert_eq!(selector.to_string(), "jsonpath:$.metadata.name");

    let selector: Selector = "jsonata: metadata.name".parse().unwrap();
    assert_eq!(selector.scheme(), "jsonata:");
    assert_eq!(selector.body(), "metadata.name");
}

#[test]
fn test_both_schemes_agree_on_paths() {
    let object = deployment();
    let expected = scalars(&["8080", "15001"]);

    assert_eq!(
        extract(
            "jsonpath:$.spec.template.spec.containers.*.ports.*.containerPort",
            &object
        ),
        expected
    );
    assert_eq!(
        extract("jsonata:spec.template.spec.containers.ports.containerPort", &object),
        expected
    );
}

#[test]
fn test_mapping_keeps_scalar_entries() {
    let labels = extract("jsonpath:$.metadata.labels", &deployment());
    let ExtractedValues::Mapping(mapping) = labels else {
        panic!("expected a mapping, got {:?}", labels)
    };
    assert_eq!(mapping.get("app").map(String::as_str), Some("web"));
    assert_eq!(mapping.get("replicas").map(String::as_str), Some("3"));
}

#[test]
fn test_missing_values_are_empty() {
    let object = deployment();
    assert!(extract("jsonpath:$.spec.selector", &object).is_empty());
    assert!(extract("jsonata:spec.selector", &object).is_empty());
    assert!(extract("jsonata:[spec.selector]", &object).is_empty());
}

#[test]
fn test_expression_transforms_values() {
    let object = deployment();
    assert_eq!(
        extract(
            "jsonata:spec.template.spec.containers[name = 'app'].image ~> $substringBefore(':')",
            &object
        ),
        scalars(&["registry.local/web"])
    );
    assert_eq!(
        extract(
            "jsonata:$map(spec.template.spec.containers, function($c) { $uppercase($c.name) })",
            &object
        ),
        scalars(&["APP", "SIDECAR"])
    );
}

#[test]
fn test_boolean_results_stringify() {
    assert_eq!(
        extract("jsonata:$count(spec.template.spec.containers) > 1", &deployment()),
        scalars(&["true"])
    );
}

#[test]
fn test_malformed_bodies_rejected() {
    assert!(matches!(
        Selector::parse("jsonpath:$.spec[?("),
        Err(LinkError::InvalidPath { .. })
    ));
    assert!(matches!(
        Selector::parse("jsonata:spec.(template"),
        Err(LinkError::InvalidExpression { .. })
    ));
    assert!(matches!(
        Selector::parse("jsonata:$unknownFunction(spec)"),
        Err(LinkError::InvalidExpression { .. })
    ));
}

#[test]
fn test_type_errors_do_not_propagate() {
    // $uppercase on a number is a runtime error, which reads as "no values"
    let selector = Selector::parse("jsonata:$uppercase(metadata.labels.replicas)").unwrap();
    assert!(selector.evaluate(&deployment()).is_empty());
}
