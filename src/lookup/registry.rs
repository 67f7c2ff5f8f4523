//! Registry trait for fetching package metadata from a remote source

#[cfg(test)]
use mockall::automock;

use crate::lookup::error::RegistryError;
use crate::lookup::types::Metadata;

/// Trait for fetching package metadata from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches every published version of a package, with dist-tags
    ///
    /// # Arguments
    /// * `package_name` - The name of the package (e.g., "@types/node")
    ///
    /// # Returns
    /// * `Ok(Metadata)` - Version records keyed by version string
    /// * `Err(RegistryError)` - If the request fails or the body is not valid metadata
    async fn fetch_metadata(&self, package_name: &str) -> Result<Metadata, RegistryError>;
}
