//! Murmur: boid flocking with predators that hunt the flock.
//!
//! The engine lives in `murmur_core`; this crate adds [`model::Simulation`],
//! which owns one world and advances it a tick at a time.

pub mod model;

pub use model::simulation::{Simulation, SimulationBuilder};
pub use murmur_core::{init_logging, SimConfig};
