//! Read-only catalog of type definitions, compiled from YAML.

mod loader;
mod types;

pub use loader::*;
pub use types::*;
