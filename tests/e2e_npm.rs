//! npm registry E2E tests

use std::sync::Arc;

use serde_json::json;

use dep_lookup::lookup::registries::NpmRegistry;
use dep_lookup::lookup::{DependencyResolver, MetadataCache, NodeError, ResolveOptions};
use dep_lookup::output::render_tree;

fn packument(name: &str, versions: &[(&str, serde_json::Value)], latest: &str) -> String {
    let versions: serde_json::Map<String, serde_json::Value> = versions
        .iter()
        .map(|(version, dependencies)| {
            (
                version.to_string(),
                json!({ "name": name, "version": version, "dependencies": dependencies }),
            )
        })
        .collect();

    json!({
        "name": name,
        "dist-tags": { "latest": latest },
        "versions": versions,
    })
    .to_string()
}

#[tokio::test]
async fn resolves_a_tree_from_the_registry() {
    let mut server = mockito::Server::new_async().await;

    let app = server
        .mock("GET", "/app")
        .with_status(200)
        .with_body(packument(
            "app",
            &[
                ("1.0.0", json!({ "@scope/util": "^1.0.0" })),
                ("1.1.0", json!({ "@scope/util": "^1.2.0", "gone": "1" })),
            ],
            "1.1.0",
        ))
        .expect(1)
        .create_async()
        .await;
    let util = server
        .mock("GET", "/@scope%2Futil")
        .with_status(200)
        .with_body(packument(
            "@scope/util",
            &[("1.2.5", json!({})), ("2.0.0", json!({}))],
            "2.0.0",
        ))
        .expect(1)
        .create_async()
        .await;
    let gone = server
        .mock("GET", "/gone")
        .with_status(404)
        .with_body(r#"{"error":"Not found"}"#)
        .expect(1)
        .create_async()
        .await;

    let resolver = DependencyResolver::new(
        Arc::new(NpmRegistry::new(&server.url())),
        Arc::new(MetadataCache::default()),
        ResolveOptions::default(),
    );

    let root = resolver.resolve("app", None).await;

    app.assert_async().await;
    util.assert_async().await;
    gone.assert_async().await;

    assert_eq!(
        render_tree(&root),
        "app@1.1.0\n    @scope/util@1.2.5\n    gone ERROR: Unable to fetch package information\n"
    );

    let json = serde_json::to_value(&root).unwrap();
    assert_eq!(json["version"], "1.1.0");
    assert_eq!(json["dependencies"][0]["name"], "@scope/util");
    assert_eq!(json["dependencies"][0]["range"], "^1.2.0");
    assert_eq!(json["dependencies"][1]["error"], "Unable to fetch package information");
    assert!(json.get("ancestry").is_none());
}

#[tokio::test]
async fn second_lookup_is_served_from_the_cache() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/solo")
        .with_status(200)
        .with_body(packument("solo", &[("0.3.1", json!({}))], "0.3.1"))
        .expect(1)
        .create_async()
        .await;

    let resolver = DependencyResolver::new(
        Arc::new(NpmRegistry::new(&server.url())),
        Arc::new(MetadataCache::default()),
        ResolveOptions::default(),
    );

    let first = resolver.resolve("solo", Some("0.3")).await;
    let second = resolver.resolve("solo", Some(">=0.3.0 <0.4.0")).await;

    mock.assert_async().await;
    assert_eq!(first.version.as_deref(), Some("0.3.1"));
    assert_eq!(second.version.as_deref(), Some("0.3.1"));
}

#[tokio::test]
async fn server_error_on_root_is_recorded_on_the_root() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/flaky")
        .with_status(500)
        .create_async()
        .await;

    let resolver = DependencyResolver::new(
        Arc::new(NpmRegistry::new(&server.url())),
        Arc::new(MetadataCache::default()),
        ResolveOptions::default(),
    );

    let root = resolver.resolve("flaky", None).await;

    assert_eq!(root.error, Some(NodeError::FetchFailed));
    assert_eq!(root.version, None);
    assert_eq!(render_tree(&root), "flaky ERROR: Unable to fetch package information\n");
    assert!(resolver.cache().is_empty());
}
