//! Registry test utilities

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;

use dep_lookup::lookup::error::RegistryError;
use dep_lookup::lookup::registry::Registry;
use dep_lookup::lookup::types::{Metadata, VersionRecord};

/// In-memory registry that records every fetch
#[derive(Default)]
pub struct FixtureRegistry {
    packages: HashMap<String, Metadata>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `name@version` with the given dependencies (in order)
    pub fn with_version(mut self, name: &str, version: &str, dependencies: &[(&str, &str)]) -> Self {
        let record = dependencies
            .iter()
            .fold(VersionRecord::new(name, version), |record, (dep, range)| {
                record.with_dependency(dep, range)
            });

        self.packages
            .entry(name.to_string())
            .or_default()
            .versions
            .get_or_insert_with(IndexMap::new)
            .insert(version.to_string(), record);
        self
    }

    pub fn with_dist_tag(mut self, name: &str, tag: &str, version: &str) -> Self {
        self.packages
            .entry(name.to_string())
            .or_default()
            .dist_tags
            .insert(tag.to_string(), version.to_string());
        self
    }

    /// Serve a document verbatim, e.g. one without `versions`
    pub fn with_metadata(mut self, name: &str, metadata: Metadata) -> Self {
        self.packages.insert(name.to_string(), metadata);
        self
    }

    /// Fail every fetch of `name` with a transport error
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Sleep this long inside every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Package names in the order they were fetched
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| *call == name).count()
    }
}

#[async_trait]
impl Registry for FixtureRegistry {
    async fn fetch_metadata(&self, package_name: &str) -> Result<Metadata, RegistryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(package_name.to_string());

        if self.failing.contains(package_name) {
            return Err(RegistryError::InvalidResponse("NetworkError".to_string()));
        }

        self.packages
            .get(package_name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))
    }
}
