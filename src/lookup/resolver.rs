//! Version resolution against registry metadata
//!
//! Maps a requested range (or the `latest` tag) to the concrete version
//! record that should be used for one occurrence of a package.

use crate::lookup::range::{VersionReq, is_valid_range};
use crate::lookup::semver::{clean_version, find_semantic_max};
use crate::lookup::types::{Metadata, VersionRecord};

/// Tag used when no usable range was requested
pub const LATEST_TAG: &str = "latest";

/// Normalize a requested range before resolution
///
/// - empty or missing -> `latest`
/// - a valid range expression -> kept as-is (trimmed)
/// - anything else that cleans up to an exact version (`v 1.2.3`) -> that version
/// - otherwise -> `latest`; unusable input is not an error
pub fn normalize_range(range: Option<&str>) -> String {
    let range = range.map(str::trim).unwrap_or_default();

    if range.is_empty() || range == LATEST_TAG {
        return LATEST_TAG.to_string();
    }

    if is_valid_range(range) {
        return range.to_string();
    }

    clean_version(range)
        .map(|version| version.to_string())
        .unwrap_or_else(|| LATEST_TAG.to_string())
}

/// Resolve a normalized range to a version record
///
/// For `latest` the `latest` dist-tag wins; without it the highest version is
/// used, pre-releases included. Any other range resolves to the highest
/// satisfying version. Returns `None` when nothing matches or the metadata
/// has no versions.
pub fn resolve<'a>(metadata: &'a Metadata, range: &str) -> Option<&'a VersionRecord> {
    let versions = metadata
        .versions
        .as_ref()
        .filter(|versions| !versions.is_empty())?;
    let available = versions.keys().map(String::as_str);

    let version = if range == LATEST_TAG {
        match metadata.dist_tag(LATEST_TAG) {
            Some(tagged) => tagged,
            None => find_semantic_max(available)?,
        }
    } else {
        VersionReq::parse(range)?.max_satisfying(available)?
    };

    versions.get(version)
}
