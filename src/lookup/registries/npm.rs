//! npm registry API implementation

use reqwest::Url;
use reqwest::header::ACCEPT;
use tracing::{debug, warn};

use crate::config::DEFAULT_REGISTRY_URL;
use crate::lookup::error::RegistryError;
use crate::lookup::registry::Registry;
use crate::lookup::types::Metadata;

/// Prefer the abbreviated install metadata document, which is much smaller
/// than the full packument but still carries dependencies and dist-tags.
/// See: https://github.com/npm/registry/blob/master/docs/responses/package-metadata.md
const ACCEPT_METADATA: &str =
    "application/vnd.npm.install-v1+json; q=1.0, application/json; q=0.8, */*";

/// Registry implementation for npm registry API
#[derive(Clone)]
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("dep-lookup/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Metadata URL for a package. The name becomes a single percent-encoded
    /// path segment, so `@types/node` is requested as `@types%2Fnode`.
    fn package_url(&self, package_name: &str) -> Result<Url, RegistryError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(package_name);
        Ok(url)
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

#[async_trait::async_trait]
impl Registry for NpmRegistry {
    async fn fetch_metadata(&self, package_name: &str) -> Result<Metadata, RegistryError> {
        let url = self.package_url(package_name)?;

        debug!("Fetching npm metadata: {}", url);
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_METADATA)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if !status.is_success() {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse npm registry response for {}: {}", package_name, e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use rstest::rstest;

    #[tokio::test]
    async fn fetch_metadata_requests_abbreviated_document() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/express")
            .match_header("accept", ACCEPT_METADATA)
            .with_status(200)
            .with_header("content-type", "application/vnd.npm.install-v1+json")
            .with_body(
                r#"{
                    "name": "express",
                    "dist-tags": { "latest": "4.18.2" },
                    "versions": {
                        "4.18.2": {
                            "name": "express",
                            "version": "4.18.2",
                            "dependencies": { "accepts": "~1.3.8", "body-parser": "1.20.1" }
                        }
                    }
                }"#,
            )
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let metadata = registry.fetch_metadata("express").await.unwrap();

        mock.assert_async().await;
        assert_eq!(metadata.dist_tag("latest"), Some("4.18.2"));
        let record = metadata.version("4.18.2").unwrap();
        assert_eq!(record.name, "express");
        assert_eq!(
            record.dependencies.get("accepts").map(String::as_str),
            Some("~1.3.8")
        );
    }

    #[tokio::test]
    async fn fetch_metadata_handles_scoped_package() {
        let mut server = Server::new_async().await;

        // Scoped packages use URL encoding: @types/node -> @types%2Fnode
        let mock = server
            .mock("GET", "/@types%2Fnode")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "versions": { "20.0.0": { "name": "@types/node", "version": "20.0.0" } } }"#)
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let metadata = registry.fetch_metadata("@types/node").await.unwrap();

        mock.assert_async().await;
        assert!(metadata.version("20.0.0").is_some());
    }

    #[tokio::test]
    async fn fetch_metadata_returns_not_found_for_nonexistent_package() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/nonexistent-package")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Not found"}"#)
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let result = registry.fetch_metadata("nonexistent-package").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn fetch_metadata_rejects_unsuccessful_status() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let result = registry.fetch_metadata("lodash").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_metadata_rejects_unparsable_body() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/lodash")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let result = registry.fetch_metadata("lodash").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_metadata_accepts_document_without_versions() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/unpublished")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{ "name": "unpublished", "time": { "unpublished": {} } }"#)
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let metadata = registry.fetch_metadata("unpublished").await.unwrap();

        mock.assert_async().await;
        assert_eq!(metadata.versions, None);
    }

    #[tokio::test]
    async fn fetch_metadata_encodes_reserved_characters_in_name() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/odd%23name%3Fx")
            .with_status(200)
            .with_body(r#"{ "versions": {} }"#)
            .create_async()
            .await;

        let registry = NpmRegistry::new(&server.url());
        let metadata = registry.fetch_metadata("odd#name?x").await.unwrap();

        mock.assert_async().await;
        assert_eq!(metadata.versions.map(|v| v.len()), Some(0));
    }

    #[rstest]
    #[case("https://registry.example.com", "express", "https://registry.example.com/express")]
    #[case(
        "https://registry.example.com",
        "@types/node",
        "https://registry.example.com/@types%2Fnode"
    )]
    #[case(
        "https://registry.example.com/npm/",
        "a b",
        "https://registry.example.com/npm/a%20b"
    )]
    #[case("https://registry.example.com", "100%", "https://registry.example.com/100%25")]
    fn package_url_encodes_name_as_one_segment(
        #[case] base_url: &str,
        #[case] package_name: &str,
        #[case] expected: &str,
    ) {
        let registry = NpmRegistry::new(base_url);

        assert_eq!(
            registry.package_url(package_name).unwrap().as_str(),
            expected
        );
    }

    #[tokio::test]
    async fn fetch_metadata_rejects_unusable_base_url() {
        let registry = NpmRegistry::new("not a url");
        let result = registry.fetch_metadata("express").await;

        assert!(matches!(result, Err(RegistryError::InvalidUrl(_))));
    }

    #[test]
    fn new_trims_trailing_slash() {
        let registry = NpmRegistry::new("https://registry.example.com/");

        assert_eq!(registry.base_url(), "https://registry.example.com");
    }
}
