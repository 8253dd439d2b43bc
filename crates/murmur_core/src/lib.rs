//! # Murmur Core
//!
//! The simulation engine behind Murmur: a flock of boids hunted by
//! predators that run a five-state behaviour machine.
//!
//! This crate contains:
//! - Steering math and the flocking engine (separation, alignment, cohesion,
//!   arrival, evasion)
//! - The agent registry and a uniform-grid spatial index
//! - The predator state machine (Idle, Patrol, Chase, Attack, Rest)
//! - Configuration, spawning, snapshots, metrics and structured logging
//!
//! ## Architecture
//!
//! - **Snapshot-consistent flocking**: forces for every agent are computed
//!   against the same state, in parallel with rayon, then applied in order
//! - **Table-driven state machine**: each state is a row of plain handler
//!   functions; transitions run exit, then enter, synchronously
//! - **Deterministic simulation**: seeded ChaCha RNG for reproducible runs
//!
//! ## Example
//!
//! ```
//! use glam::Vec3;
//! use murmur_core::flocking;
//! use murmur_core::registry::AgentRegistry;
//! use murmur_core::spatial_hash::SpatialHash;
//! use murmur_data::{Agent, BoidParams};
//!
//! let params = BoidParams::default();
//! let mut registry = AgentRegistry::new();
//! registry.spawn(Agent::new(Vec3::ZERO, params).with_velocity(Vec3::X));
//! registry.spawn(Agent::new(Vec3::new(1.0, 0.0, 0.0), params));
//!
//! let mut spatial = SpatialHash::new(4.0, params.bounds).unwrap();
//! let stepped = flocking::step_all(&mut registry, Some(&mut spatial), &[], 0.1).unwrap();
//! assert_eq!(stepped, 2);
//! ```

/// Configuration management for simulation parameters
pub mod config;
/// Error type shared by the engine
pub mod error;
/// Boid steering forces and integration
pub mod flocking;
/// Flock and predator spawning
pub mod lifecycle;
/// Performance metrics collection and logging
pub mod metrics;
/// Notification hooks for hosts and tests
pub mod observer;
/// Predator behaviour state machine
pub mod predator;
/// Generational arena of agents
pub mod registry;
/// Line-of-sight tests
pub mod sight;
/// Serializable simulation views
pub mod snapshot;
/// Spatial hashing for proximity queries
pub mod spatial_hash;
/// Vector helpers and primitive steering behaviours
pub mod steering;

pub use config::SimConfig;
pub use error::{CoreError, Result};
pub use metrics::{init_logging, Metrics};
pub use observer::{RecordingObserver, SimEvent, SimObserver, TracingObserver};
pub use predator::HuntContext;
pub use registry::AgentRegistry;
pub use sight::{LineOfSight, OpenField, SphereObstacle, SphereObstacles};
pub use snapshot::SimulationSnapshot;
pub use spatial_hash::{BucketKey, SpatialHash, SpatialIndex};
