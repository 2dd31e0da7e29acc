//! Shared vocabulary between the Sovereign engine and whatever drives it.
//!
//! Everything here is plain data: typed ids, grid coordinates, commands,
//! events and the flat snapshot records used at the persistence boundary.

mod command;
mod event;
mod grid;
mod ids;
mod snapshot;
mod types;
mod wire;

pub use command::*;
pub use event::*;
pub use grid::*;
pub use ids::*;
pub use snapshot::*;
pub use types::*;
pub use wire::*;
