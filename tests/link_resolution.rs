//! Link resolution tests
//!
//! End-to-end checks of the built-in rules and of the resolver guarantees:
//! ordering, symmetry between the two sides of a rule, and all-matchers
//! conjunction.

use kubelinks::{KubernetesObject, ResolvedLink};
use kubelinks::kube::parse_manifests;
use kubelinks::links::{
    Direction, LinkRegistry, LinkResolver, MatchType, Role, SpecLink, SpecLinkMatcher,
    resolve_links,
};

const SHOP: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: shop
spec:
  template:
    metadata:
      labels:
        app: web
        tier: frontend
    spec:
      serviceAccountName: web-sa
      volumes:
        - name: config
          configMap:
            name: web-config
        - name: scratch
          emptyDir: {}
---
apiVersion: v1
kind: Service
metadata:
  name: web
  namespace: shop
spec:
  selector:
    app: web
---
apiVersion: v1
kind: Service
metadata:
  name: api
  namespace: shop
spec:
  selector:
    app: api
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: web-config
  namespace: shop
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: unused
  namespace: shop
---
apiVersion: v1
kind: ServiceAccount
metadata:
  name: web-sa
  namespace: shop
---
apiVersion: policy/v1
kind: PodDisruptionBudget
metadata:
  name: web-pdb
  namespace: shop
spec:
  selector:
    matchLabels:
      app: web
---
apiVersion: autoscaling/v2
kind: HorizontalPodAutoscaler
metadata:
  name: web-hpa
  namespace: shop
spec:
  scaleTargetRef:
    apiVersion: apps/v1
    kind: Deployment
    name: web
---
apiVersion: v1
kind: Endpoints
metadata:
  name: web
  namespace: shop
"#;

fn pool() -> Vec<KubernetesObject> {
    parse_manifests(SHOP).unwrap()
}

fn find<'a>(pool: &'a [KubernetesObject], kind: &str, name: &str) -> &'a KubernetesObject {
    pool.iter()
        .find(|o| o.kind() == kind && o.name() == name)
        .unwrap_or_else(|| panic!("{}/{} missing from fixture", kind, name))
}

fn counterpart_keys(focal: &KubernetesObject, pool: &[KubernetesObject]) -> Vec<String> {
    resolve_links(focal, pool)
        .iter()
        .map(|link| link.counterpart().unwrap().key())
        .collect()
}

#[test]
fn test_deployment_links_in_rule_order() {
    let pool = pool();
    let deployment = find(&pool, "Deployment", "web");

    let links = resolve_links(deployment, &pool);
    let rules: Vec<&str> = links.iter().map(|link| link.rule.id()).collect();
    assert_eq!(
        rules,
        vec![
            "PodDisruptionBudget->Deployment",
            "Service->Deployment",
            "ConfigMap->Deployment",
            "ServiceAccount->Deployment",
            "HorizontalPodAutoscaler->Deployment",
        ]
    );

    assert_eq!(
        counterpart_keys(deployment, &pool),
        vec![
            "PodDisruptionBudget/shop/web-pdb",
            "Service/shop/web",
            "ConfigMap/shop/web-config",
            "ServiceAccount/shop/web-sa",
            "HorizontalPodAutoscaler/shop/web-hpa",
        ]
    );
    assert!(links.iter().all(|link| link.focal_role == Some(Role::Target)));
}

#[test]
fn test_configmap_links_to_single_deployment() {
    let pool = pool();
    let config_map = find(&pool, "ConfigMap", "web-config");

    let links = resolve_links(config_map, &pool);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].source.key(), "ConfigMap/shop/web-config");
    assert_eq!(links[0].target.key(), "Deployment/shop/web");
    assert_eq!(links[0].focal_role, Some(Role::Source));

    let unused = find(&pool, "ConfigMap", "unused");
    assert!(resolve_links(unused, &pool).is_empty());
}

#[test]
fn test_links_are_symmetric() {
    let pool = pool();
    let deployment = find(&pool, "Deployment", "web");

    for link in resolve_links(deployment, &pool) {
        let other = link.counterpart().unwrap();
        let back = resolve_links(other, &pool);
        assert!(
            back.iter()
                .any(|b| std::ptr::eq(b.rule, link.rule) && b.target.same_identity(deployment)),
            "{} does not link back to the deployment",
            other
        );
    }
}

#[test]
fn test_resolution_is_deterministic() {
    let pool = pool();
    let service = find(&pool, "Service", "web");

    let first = resolve_links(service, &pool);
    let second = resolve_links(service, &pool);
    assert_eq!(first, second);
    assert_eq!(
        counterpart_keys(service, &pool),
        vec!["Deployment/shop/web", "Endpoints/shop/web"]
    );
}

#[test]
fn test_service_selector_must_be_subset() {
    let pool = pool();
    let api = find(&pool, "Service", "api");
    assert!(resolve_links(api, &pool).is_empty());
}

#[test]
fn test_unknown_kind_has_no_links() {
    let pool = parse_manifests(
        r#"
kind: Namespace
metadata:
  name: shop
"#,
    )
    .unwrap();
    assert!(resolve_links(&pool[0], &pool).is_empty());
}

#[test]
fn test_secret_rule_requires_every_matcher() {
    // All three secret references must point at the secret
    let pool = parse_manifests(
        r#"
kind: Secret
metadata:
  name: db
  namespace: shop
---
kind: Deployment
metadata:
  name: full
  namespace: shop
spec:
  template:
    spec:
      containers:
        - name: app
          env:
            - name: PASSWORD
              valueFrom:
                secretKeyRef:
                  name: db
                  key: password
          envFrom:
            - secretRef:
                name: db
      volumes:
        - name: creds
          secret:
            secretName: db
---
kind: Deployment
metadata:
  name: env-only
  namespace: shop
spec:
  template:
    spec:
      containers:
        - name: app
          envFrom:
            - secretRef:
                name: db
"#,
    )
    .unwrap();

    let secret = find(&pool, "Secret", "db");
    assert_eq!(counterpart_keys(secret, &pool), vec!["Deployment/shop/full"]);
}

#[test]
fn test_virtual_service_host_is_shortened() {
    let pool = parse_manifests(
        r#"
kind: VirtualService
metadata:
  name: reviews-route
  namespace: shop
spec:
  http:
    - route:
        - destination:
            host: reviews.shop.svc.cluster.local
---
kind: VirtualService
metadata:
  name: ratings-route
  namespace: shop
spec:
  http:
    - route:
        - destination:
            host: ratings
---
kind: Service
metadata:
  name: reviews
  namespace: shop
---
kind: Service
metadata:
  name: ratings
  namespace: shop
"#,
    )
    .unwrap();

    let reviews = find(&pool, "Service", "reviews");
    assert_eq!(
        counterpart_keys(reviews, &pool),
        vec!["VirtualService/shop/reviews-route"]
    );

    let ratings_route = find(&pool, "VirtualService", "ratings-route");
    assert_eq!(
        counterpart_keys(ratings_route, &pool),
        vec!["Service/shop/ratings"]
    );
}

#[test]
fn test_hpa_ignores_other_target_kinds() {
    let pool = parse_manifests(
        r#"
kind: HorizontalPodAutoscaler
metadata:
  name: web-hpa
spec:
  scaleTargetRef:
    kind: StatefulSet
    name: web
---
kind: Deployment
metadata:
  name: web
"#,
    )
    .unwrap();

    let hpa = find(&pool, "HorizontalPodAutoscaler", "web-hpa");
    assert!(resolve_links(hpa, &pool).is_empty());
}

#[test]
fn test_namespace_scoping() {
    let pool = parse_manifests(
        r#"
kind: Service
metadata:
  name: web
  namespace: shop
---
kind: Endpoints
metadata:
  name: web
  namespace: staging
"#,
    )
    .unwrap();
    let service = find(&pool, "Service", "web");

    let registry = LinkRegistry::builtin();
    assert_eq!(LinkResolver::new(registry).resolve(service, &pool).len(), 1);
    assert!(
        LinkResolver::new(registry)
            .namespace_scoped(true)
            .resolve(service, &pool)
            .is_empty()
    );
}

#[test]
fn test_target_source_direction() {
    // Ingress objects are read with sourceSelector, Services with targetSelector
    let registry = LinkRegistry::new([SpecLink {
        name: None,
        direction: Direction::TargetSource,
        source_kind: "Service".to_string(),
        target_kind: "Ingress".to_string(),
        matchers: vec![SpecLinkMatcher {
            source_selector: "jsonpath:$.spec.rules.*.http.paths.*.backend.service.name"
                .to_string(),
            target_selector: "jsonpath:$.metadata.name".to_string(),
            match_type: MatchType::Subset,
        }],
    }])
    .unwrap();

    let pool = parse_manifests(
        r#"
kind: Ingress
metadata:
  name: public
spec:
  rules:
    - http:
        paths:
          - backend:
              service:
                name: web
---
kind: Service
metadata:
  name: web
"#,
    )
    .unwrap();
    let ingress = find(&pool, "Ingress", "public");
    let service = find(&pool, "Service", "web");

    let resolver = LinkResolver::new(&registry);
    let from_ingress = resolver.resolve(ingress, &pool);
    assert_eq!(from_ingress.len(), 1);
    assert_eq!(from_ingress[0].source.key(), "Service/web");
    assert_eq!(from_ingress[0].target.key(), "Ingress/public");

    let from_service = resolver.resolve(service, &pool);
    let expected: Vec<ResolvedLink> = from_ingress
        .iter()
        .map(|link| ResolvedLink {
            focal_role: Some(Role::Source),
            ..*link
        })
        .collect();
    assert_eq!(from_service, expected);
}

#[test]
fn test_resolve_all_orders_by_rule() {
    let pool = pool();
    let links = LinkResolver::new(LinkRegistry::builtin()).resolve_all(&pool);

    let pairs: Vec<(String, String)> = links
        .iter()
        .map(|link| (link.source.key(), link.target.key()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("PodDisruptionBudget/shop/web-pdb".into(), "Deployment/shop/web".into()),
            ("Service/shop/web".into(), "Deployment/shop/web".into()),
            ("ConfigMap/shop/web-config".into(), "Deployment/shop/web".into()),
            ("ServiceAccount/shop/web-sa".into(), "Deployment/shop/web".into()),
            ("HorizontalPodAutoscaler/shop/web-hpa".into(), "Deployment/shop/web".into()),
            ("Endpoints/shop/web".into(), "Service/shop/web".into()),
        ]
    );
    assert!(links.iter().all(|link| link.focal_role.is_none()));
}
