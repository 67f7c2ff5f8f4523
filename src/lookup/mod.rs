//! Dependency lookup against a package registry
//!
//! Builds the dependency tree of a package by resolving every dependency edge
//! against registry metadata, with cycle, depth and deadline guards.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│    Cache    │◀────│  Traversal  │
//! │  (fetch)    │     │ (TTL store) │     │ (BFS tree)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │ Registries  │                         │  Resolver   │
//! │   (npm)     │                         │(range→ver)  │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: In-memory TTL cache for registry metadata
//! - [`error`]: Registry, config and per-node error types
//! - [`query`]: `name[@version]` query parsing
//! - [`range`]: npm range grammar and matching
//! - [`registry`]: Registry trait for fetching metadata from remote sources
//! - [`registries`]: Concrete registry implementations (npm)
//! - [`resolver`]: Range normalization and version selection
//! - [`semver`]: Shared semver utilities
//! - [`traversal`]: Breadth-first dependency tree builder
//! - [`types`]: Registry metadata shapes

pub mod cache;
pub mod error;
pub mod query;
pub mod range;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod semver;
pub mod traversal;
pub mod types;

pub use cache::{MetadataCache, TtlCache};
pub use error::NodeError;
pub use query::PackageQuery;
pub use traversal::{DependencyResolver, Node, ResolveOptions, resolve_dependencies};
