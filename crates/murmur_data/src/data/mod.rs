//! Core data structures for the murmur simulation.

pub mod agent;
pub mod predator;
