pub mod registry;

pub use registry::FixtureRegistry;
