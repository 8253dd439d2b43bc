//! Plain data shared by the murmur simulation crates.
//!
//! Nothing in here knows how to move an agent or run a predator; the types
//! only describe state so that hosts, snapshots and the core engine agree on
//! a single vocabulary.

pub mod data;

pub use data::agent::{Agent, AgentId, BoidParams, FlockWeights, MapBounds, PredatorId};
pub use data::predator::{Predator, PredatorParams, PredatorState, TraversalDirection};
pub use glam::Vec3;
