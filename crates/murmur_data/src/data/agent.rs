use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generational handle into the agent arena.
///
/// A handle stays valid until its slot is reaped; after that the slot's
/// generation moves on and the old handle resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId {
    pub index: u32,
    pub generation: u32,
}

impl AgentId {
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}v{}", self.index, self.generation)
    }
}

/// Index of a predator inside its simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PredatorId(pub u32);

impl fmt::Display for PredatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "predator#{}", self.0)
    }
}

/// Half extents of the wrap-around map on the ground plane.
///
/// The playable area is `[-x, x] x [-z, z]`; the vertical axis is unbounded.
/// Wrapping can land an agent exactly on the `+x`/`+z` edge, so both edges
/// count as inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapBounds {
    pub x: f32,
    pub z: f32,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self { x: 50.0, z: 50.0 }
    }
}

impl MapBounds {
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= -self.x && p.x <= self.x && p.z >= -self.z && p.z <= self.z
    }

    #[must_use]
    pub fn min(&self) -> Vec3 {
        Vec3::new(-self.x, 0.0, -self.z)
    }

    #[must_use]
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }
}

/// Weights applied to each flocking contribution before they are summed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockWeights {
    pub separation: f32,
    pub alignment: f32,
    pub cohesion: f32,
    pub arrive: f32,
}

impl Default for FlockWeights {
    fn default() -> Self {
        Self {
            separation: 1.5,
            alignment: 1.0,
            cohesion: 1.0,
            arrive: 1.0,
        }
    }
}

/// Kinematic limits, perception radii and weights of a single boid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoidParams {
    pub max_speed: f32,
    pub max_force: f32,
    /// Radius used by alignment and cohesion.
    pub view_distance: f32,
    pub separation_distance: f32,
    /// Distance to the flee target below which the boid stops flocking and runs.
    pub evade_radius: f32,
    pub arrive_radius: f32,
    /// Fraction of the external impulse that survives one second.
    pub impulse_damping: f32,
    pub weights: FlockWeights,
    pub bounds: MapBounds,
}

impl Default for BoidParams {
    fn default() -> Self {
        Self {
            max_speed: 6.0,
            max_force: 0.4,
            view_distance: 6.0,
            separation_distance: 2.0,
            evade_radius: 5.0,
            arrive_radius: 4.0,
            impulse_damping: 0.1,
            weights: FlockWeights::default(),
            bounds: MapBounds::default(),
        }
    }
}

/// A flocking agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: Vec3,
    /// Steering velocity; its magnitude never exceeds `params.max_speed`.
    pub velocity: Vec3,
    /// External push (bulk evade) integrated on top of the steering velocity.
    pub impulse: Vec3,
    pub forward: Vec3,
    pub alive: bool,
    /// Set while a predator has this agent in its target set.
    pub marked: bool,
    pub flee_target: Option<PredatorId>,
    pub seek_target: Option<Vec3>,
    pub params: BoidParams,
}

impl Agent {
    /// Creates a live, unregistered agent at `position`. The registry assigns
    /// the real id on spawn.
    #[must_use]
    pub fn new(position: Vec3, params: BoidParams) -> Self {
        Self {
            id: AgentId::new(u32::MAX, 0),
            position,
            velocity: Vec3::ZERO,
            impulse: Vec3::ZERO,
            forward: Vec3::Z,
            alive: true,
            marked: false,
            flee_target: None,
            seek_target: None,
            params,
        }
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity.clamp_length_max(self.params.max_speed);
        self
    }

    #[must_use]
    pub fn fleeing(mut self, predator: PredatorId) -> Self {
        self.flee_target = Some(predator);
        self
    }

    #[must_use]
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_closed() {
        let b = MapBounds { x: 10.0, z: 5.0 };
        assert!(b.contains(Vec3::new(-10.0, 3.0, -5.0)));
        assert!(b.contains(Vec3::new(10.0, 0.0, 5.0)));
        assert!(!b.contains(Vec3::new(10.01, 0.0, 0.0)));
        assert!(!b.contains(Vec3::new(0.0, 0.0, -5.01)));
    }

    #[test]
    fn test_with_velocity_respects_max_speed() {
        let params = BoidParams::default();
        let a = Agent::new(Vec3::ZERO, params).with_velocity(Vec3::new(100.0, 0.0, 0.0));
        assert!((a.velocity.length() - params.max_speed).abs() < 1e-4);
    }

    #[test]
    fn test_agent_id_serde() {
        let id = AgentId::new(3, 7);
        let json = serde_json::to_string(&id).unwrap();
        let back: AgentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
        assert_eq!(id.to_string(), "agent#3v7");
    }
}
