//! Breadth-first dependency tree builder
//!
//! Every dependency edge becomes its own [`Node`], resolved independently of
//! any other occurrence of the same package. The queue is drained one node at
//! a time: fetch metadata (through the cache), resolve the requested range,
//! then expand the resolved version's dependencies into child nodes.
//!
//! Expansion stops at three guards:
//! - a dependency whose name is already among its own ancestors (`Recursion`)
//! - a dependency whose ancestry reached `max_depth` (`Max Depth Exceeded`)
//! - a node dequeued after the deadline (`Time Limit Exceeded`)
//!
//! The deadline is checked only between nodes; an in-flight fetch always
//! completes. Because the queue is FIFO, every node of depth `n` is attempted
//! before any node of depth `n + 1`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_MAX_DEPTH, DEFAULT_TIMEOUT_MS};
use crate::lookup::cache::MetadataCache;
use crate::lookup::error::{NodeError, RegistryError};
use crate::lookup::registry::Registry;
use crate::lookup::resolver::{normalize_range, resolve};
use crate::lookup::types::{Metadata, VersionRecord};

/// Limits applied to a single traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Dependencies whose ancestry reaches this length are not expanded
    pub max_depth: usize,
    pub timeout: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// One package occurrence in the dependency tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Requested name, replaced by the registry's canonical name once resolved
    pub name: String,
    /// Normalized range or tag requested for this occurrence
    pub range: String,
    pub version: Option<String>,
    /// `None` for leaves and for nodes that were never expanded
    pub dependencies: Option<Vec<Node>>,
    /// Package names from the root down to this node's parent
    #[serde(skip)]
    pub ancestry: Vec<String>,
    pub error: Option<NodeError>,
}

impl Node {
    fn pending(name: &str, range: String, ancestry: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            range,
            version: None,
            dependencies: None,
            ancestry,
            error: None,
        }
    }

    /// Number of ancestors; the root is at depth 0
    pub fn depth(&self) -> usize {
        self.ancestry.len()
    }

    pub fn is_resolved(&self) -> bool {
        self.version.is_some() && self.error.is_none()
    }

    pub fn is_pending(&self) -> bool {
        self.version.is_none() && self.error.is_none()
    }

    /// Visit every node in pre-order together with its depth below this node
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&Node, usize),
    {
        self.walk_from(&mut visit, 0);
    }

    fn walk_from<F>(&self, visit: &mut F, depth: usize)
    where
        F: FnMut(&Node, usize),
    {
        visit(self, depth);
        for child in self.dependencies.iter().flatten() {
            child.walk_from(visit, depth + 1);
        }
    }

    /// Record the resolved version and create one child per dependency.
    ///
    /// Returns the indices of the children that still need processing.
    fn expand(&mut self, record: &VersionRecord, max_depth: usize) -> Vec<usize> {
        if !record.name.is_empty() {
            self.name = record.name.clone();
        }
        self.version = Some(record.version.clone());

        if record.dependencies.is_empty() {
            return Vec::new();
        }

        let mut ancestry = self.ancestry.clone();
        ancestry.push(self.name.clone());

        let mut children = Vec::with_capacity(record.dependencies.len());
        let mut queued = Vec::new();

        for (index, (dep_name, dep_range)) in record.dependencies.iter().enumerate() {
            let mut child = Node::pending(dep_name, normalize_range(Some(dep_range)), ancestry.clone());

            if child.ancestry.contains(dep_name) {
                debug!("Cycle detected: {} -> {}", self.name, dep_name);
                child.error = Some(NodeError::Recursion);
            } else if child.depth() >= max_depth {
                child.error = Some(NodeError::MaxDepthExceeded);
            } else {
                queued.push(index);
            }

            children.push(child);
        }

        self.dependencies = Some(children);
        queued
    }

    fn mark_unprocessed(&mut self) {
        if self.is_pending() {
            self.error = Some(NodeError::NotProcessed);
        }
        for child in self.dependencies.iter_mut().flatten() {
            child.mark_unprocessed();
        }
    }
}

/// Node addressed by its child indices from the root
fn node_at_mut<'a>(root: &'a mut Node, path: &[usize]) -> Option<&'a mut Node> {
    path.iter()
        .try_fold(root, |node, &index| node.dependencies.as_mut()?.get_mut(index))
}

/// Resolves dependency trees against one registry, sharing a metadata cache
/// between calls.
pub struct DependencyResolver {
    registry: Arc<dyn Registry>,
    cache: Arc<MetadataCache>,
    options: ResolveOptions,
}

impl DependencyResolver {
    pub fn new(
        registry: Arc<dyn Registry>,
        cache: Arc<MetadataCache>,
        options: ResolveOptions,
    ) -> Self {
        Self {
            registry,
            cache,
            options,
        }
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    /// Build the dependency tree for `name` at `range` (`None` means `latest`)
    pub async fn resolve(&self, name: &str, range: Option<&str>) -> Node {
        resolve_dependencies(
            self.registry.as_ref(),
            &self.cache,
            name,
            range,
            &self.options,
        )
        .await
    }
}

/// Build the dependency tree for `name` at `range` (`None` means `latest`).
///
/// Registry failures never escape: each one is recorded on the node that
/// caused it and the rest of the tree is still built.
pub async fn resolve_dependencies(
    registry: &dyn Registry,
    cache: &MetadataCache,
    name: &str,
    range: Option<&str>,
    options: &ResolveOptions,
) -> Node {
    let deadline = Instant::now().checked_add(options.timeout);
    let mut root = Node::pending(name, normalize_range(range), Vec::new());
    let mut queue: VecDeque<Vec<usize>> = VecDeque::from([Vec::new()]);
    let mut processed = 0usize;

    while let Some(path) = queue.pop_front() {
        let Some(node) = node_at_mut(&mut root, &path) else {
            continue;
        };
        processed += 1;

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            debug!("Deadline reached before processing {}", node.name);
            node.error = Some(NodeError::TimeLimitExceeded);
            continue;
        }

        let package_name = node.name.clone();
        let metadata = match cached_metadata(registry, cache, &package_name).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Failed to fetch metadata for {}: {}", package_name, e);
                if let Some(node) = node_at_mut(&mut root, &path) {
                    node.error = Some(NodeError::FetchFailed);
                }
                continue;
            }
        };

        let Some(node) = node_at_mut(&mut root, &path) else {
            continue;
        };

        let Some(record) = resolve(&metadata, &node.range) else {
            debug!("No version of {} satisfies {}", node.name, node.range);
            node.error = Some(NodeError::PackageNotFound);
            continue;
        };

        for index in node.expand(record, options.max_depth) {
            let mut child_path = path.clone();
            child_path.push(index);
            queue.push_back(child_path);
        }
    }

    root.mark_unprocessed();

    info!(
        "Resolved dependency tree for {}@{} ({} nodes processed)",
        root.name, root.range, processed
    );
    root
}

/// Metadata from the cache, falling back to the registry on a miss.
/// Only successful fetches are cached.
async fn cached_metadata(
    registry: &dyn Registry,
    cache: &MetadataCache,
    package_name: &str,
) -> Result<Arc<Metadata>, RegistryError> {
    if let Some(metadata) = cache.get(package_name) {
        debug!("Cache hit for {}", package_name);
        return Ok(metadata);
    }

    debug!("Cache miss for {}, fetching from registry", package_name);
    let metadata = Arc::new(registry.fetch_metadata(package_name).await?);
    cache.set(package_name.to_string(), Arc::clone(&metadata));
    Ok(metadata)
}
