//! Rules engine for Sovereign, a turn-based 4X strategy simulation.
//!
//! The engine owns a square-grid world, players, cities and units, and
//! advances them through commands. Catalog data is loaded once and shared as
//! an `Arc<Catalog>`.

pub mod ai;
mod catalog;
mod city;
mod combat;
mod config;
mod entities;
mod fog;
mod game;
mod map;
pub mod mapgen;
mod player;
mod production;
mod research;
mod rng;
pub mod selfplay;
mod snapshot;
mod state;
mod trade;
mod turn;
mod unit;
mod yields;

pub use crate::ai::run_random_walk;
pub use crate::catalog::*;
pub use crate::city::*;
pub use crate::combat::*;
pub use crate::config::*;
pub use crate::entities::*;
pub use crate::fog::*;
pub use crate::game::*;
pub use crate::map::*;
pub use crate::mapgen::{find_start_positions, generate_map, MapGenConfig, ResourceBand};
pub use crate::player::*;
pub use crate::production::*;
pub use crate::research::*;
pub use crate::rng::*;
pub use crate::selfplay::{run_simulation, PlayerReport, SimulationConfig, SimulationReport};
pub use crate::snapshot::*;
pub use crate::state::*;
pub use crate::trade::*;
pub use crate::turn::*;
pub use crate::unit::*;
pub use crate::yields::*;
