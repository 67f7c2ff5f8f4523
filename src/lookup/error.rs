use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid registry URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Package name is required, e.g. react or react@^18 (got {0:?})")]
    EmptyName(String),
}

/// Failure attached to a single node of a dependency tree.
///
/// The display strings are part of the output contract and are rendered
/// as-is by consumers of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("Unable to fetch package information")]
    FetchFailed,

    #[error("Package Not Found")]
    PackageNotFound,

    #[error("Recursion")]
    Recursion,

    #[error("Max Depth Exceeded")]
    MaxDepthExceeded,

    #[error("Time Limit Exceeded")]
    TimeLimitExceeded,

    /// Still queued when the traversal returned.
    #[error("Not Processed")]
    NotProcessed,
}

impl Serialize for NodeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
