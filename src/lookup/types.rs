//! Registry metadata shapes shared by the registry client and the resolver

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// Registry response for one package name.
///
/// `versions` stays `None` when the registry omits it; the resolver treats
/// that the same as a package with no published versions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub versions: Option<IndexMap<String, VersionRecord>>,
    #[serde(default, rename = "dist-tags", deserialize_with = "null_as_default")]
    pub dist_tags: HashMap<String, String>,
}

impl Metadata {
    /// Version record for an exact version string
    pub fn version(&self, version: &str) -> Option<&VersionRecord> {
        self.versions.as_ref()?.get(version)
    }

    pub fn dist_tag(&self, tag: &str) -> Option<&str> {
        self.dist_tags.get(tag).map(String::as_str)
    }
}

/// One published version of a package.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VersionRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Dependency name to requested range, in the order the registry lists them
    #[serde(default, deserialize_with = "lenient_dependencies")]
    pub dependencies: IndexMap<String, String>,
}

impl VersionRecord {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            dependencies: IndexMap::new(),
        }
    }

    pub fn with_dependency(mut self, name: &str, range: &str) -> Self {
        self.dependencies.insert(name.to_string(), range.to_string());
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDependencies {
    Map(IndexMap<String, serde_json::Value>),
    Other(serde_json::Value),
}

/// Old packages occasionally publish `dependencies` as an array or with
/// non-string ranges. Those entries are dropped instead of failing the whole
/// document.
fn lenient_dependencies<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let RawDependencies::Map(map) = RawDependencies::deserialize(deserializer)? else {
        return Ok(IndexMap::new());
    };

    Ok(map
        .into_iter()
        .filter_map(|(name, range)| match range {
            serde_json::Value::String(range) => Some((name, range)),
            _ => None,
        })
        .collect())
}
