//! Resolve the dependency tree of an npm package.
//!
//! The entry point is [`lookup::DependencyResolver`] (or the free function
//! [`lookup::resolve_dependencies`]); it returns a [`lookup::Node`] tree in which
//! every failure is recorded on the node that caused it.

pub mod config;
pub mod logging;
pub mod lookup;
pub mod output;
