//! Configuration management for simulation parameters.
//!
//! Strongly typed sections that map onto a `murmur.toml` file. Every section
//! has defaults, so a file only needs the values it changes.
//!
//! ## Example `murmur.toml`
//!
//! ```toml
//! [world]
//! bounds = { x = 40.0, z = 40.0 }
//! agent_count = 150
//! seed = 42
//!
//! [boid]
//! max_speed = 6.0
//! evade_radius = 5.0
//!
//! [predator]
//! chase_speed = 9.0
//! spawn_points = [[0.0, 0.0, 0.0]]
//! waypoints = [[-20.0, 0.0, 0.0], [0.0, 0.0, 20.0], [20.0, 0.0, 0.0]]
//!
//! [[obstacles]]
//! center = [5.0, 0.0, 5.0]
//! radius = 2.0
//! ```

use crate::sight::{SphereObstacle, SphereObstacles};
use anyhow::Context;
use glam::Vec3;
use murmur_data::{BoidParams, FlockWeights, MapBounds, PredatorParams};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// World-level simulation configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub bounds: MapBounds,
    /// Edge length of one spatial hash bucket.
    pub cell_size: f32,
    pub agent_count: usize,
    /// Height agents are spawned at; motion stays on this plane.
    pub spawn_height: f32,
    /// Timestep used by `Simulation::step_fixed`.
    pub fixed_dt: f32,
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds: MapBounds::default(),
            cell_size: 4.0,
            agent_count: 100,
            spawn_height: 0.0,
            fixed_dt: 1.0 / 60.0,
            seed: None,
        }
    }
}

/// Boid kinematics, perception and weights. The map bounds come from
/// [`WorldConfig`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BoidConfig {
    pub max_speed: f32,
    pub max_force: f32,
    pub view_distance: f32,
    pub separation_distance: f32,
    pub evade_radius: f32,
    pub arrive_radius: f32,
    pub impulse_damping: f32,
    pub weights: FlockWeights,
}

impl Default for BoidConfig {
    fn default() -> Self {
        let d = BoidParams::default();
        Self {
            max_speed: d.max_speed,
            max_force: d.max_force,
            view_distance: d.view_distance,
            separation_distance: d.separation_distance,
            evade_radius: d.evade_radius,
            arrive_radius: d.arrive_radius,
            impulse_damping: d.impulse_damping,
            weights: d.weights,
        }
    }
}

impl BoidConfig {
    #[must_use]
    pub fn to_params(&self, bounds: MapBounds) -> BoidParams {
        BoidParams {
            max_speed: self.max_speed,
            max_force: self.max_force,
            view_distance: self.view_distance,
            separation_distance: self.separation_distance,
            evade_radius: self.evade_radius,
            arrive_radius: self.arrive_radius,
            impulse_damping: self.impulse_damping,
            weights: self.weights,
            bounds,
        }
    }
}

/// Predator tuning plus where predators start and which route they patrol.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PredatorConfig {
    #[serde(flatten)]
    pub params: PredatorParams,
    /// One predator is created per spawn point.
    pub spawn_points: Vec<Vec3>,
    pub waypoints: Vec<Vec3>,
}

impl Default for PredatorConfig {
    fn default() -> Self {
        Self {
            params: PredatorParams::default(),
            spawn_points: vec![Vec3::ZERO],
            waypoints: vec![
                Vec3::new(-20.0, 0.0, -20.0),
                Vec3::new(20.0, 0.0, -20.0),
                Vec3::new(20.0, 0.0, 20.0),
                Vec3::new(-20.0, 0.0, 20.0),
            ],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub boid: BoidConfig,
    pub predator: PredatorConfig,
    pub obstacles: Vec<SphereObstacle>,
}

impl SimConfig {
    /// Validates all configuration parameters.
    ///
    /// Degenerate kinematics or an empty patrol route are rejected here so
    /// the core never has to produce NaN motion.
    pub fn validate(&self) -> anyhow::Result<()> {
        let w = &self.world;
        anyhow::ensure!(
            w.bounds.x > 0.0 && w.bounds.z > 0.0,
            "Map bounds must be positive"
        );
        anyhow::ensure!(w.cell_size > 0.0, "Cell size must be positive");
        anyhow::ensure!(
            w.agent_count <= 100_000,
            "Agent count too large (max 100000)"
        );
        anyhow::ensure!(
            w.fixed_dt.is_finite() && w.fixed_dt > 0.0,
            "Fixed timestep must be positive"
        );

        let b = &self.boid;
        anyhow::ensure!(b.max_speed > 0.0, "Boid max speed must be positive");
        anyhow::ensure!(b.max_force > 0.0, "Boid max force must be positive");
        anyhow::ensure!(
            b.view_distance >= 0.0
                && b.separation_distance >= 0.0
                && b.evade_radius >= 0.0
                && b.arrive_radius >= 0.0,
            "Boid perception radii must be non-negative"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&b.impulse_damping),
            "Impulse damping must be in [0.0, 1.0]"
        );

        let p = &self.predator;
        if !p.spawn_points.is_empty() {
            anyhow::ensure!(
                !p.waypoints.is_empty(),
                "Predators need at least one waypoint"
            );
        }
        crate::predator::validate_params(&p.params)
            .map_err(|e| anyhow::anyhow!("Invalid predator parameters: {e}"))?;

        for o in &self.obstacles {
            anyhow::ensure!(o.radius >= 0.0, "Obstacle radius must be non-negative");
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    #[must_use]
    pub fn boid_params(&self) -> BoidParams {
        self.boid.to_params(self.world.bounds)
    }

    #[must_use]
    pub fn sight(&self) -> SphereObstacles {
        SphereObstacles::new(self.obstacles.clone())
    }

    /// Hash of everything that influences behaviour, for run records.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.world).as_bytes());
        hasher.update(format!("{:?}", self.boid).as_bytes());
        hasher.update(format!("{:?}", self.predator).as_bytes());
        hasher.update(format!("{:?}", self.obstacles).as_bytes());
        hex::encode(hasher.finalize())
    }
}
