//! Creating flocks and predators from a [`SimConfig`].

use crate::config::SimConfig;
use crate::error::Result;
use crate::predator::{validate_predator, waypoints};
use crate::registry::AgentRegistry;
use crate::steering::normalize_or_zero;
use glam::Vec3;
use murmur_data::{Agent, AgentId, Predator, PredatorId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic generator for a seeded run, entropy otherwise.
#[must_use]
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Random horizontal direction of unit length.
pub fn random_heading<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(rng.gen_range(-1.0..1.0), 0.0, rng.gen_range(-1.0..1.0));
        let heading = normalize_or_zero(v);
        if heading != Vec3::ZERO {
            return heading;
        }
    }
}

/// Scatters `world.agent_count` boids uniformly over the map and registers
/// them. Each one starts with a unit-speed push in a random horizontal
/// direction and flees the predator spawned closest to it.
pub fn spawn_flock<R: Rng>(
    registry: &mut AgentRegistry,
    config: &SimConfig,
    rng: &mut R,
) -> Result<Vec<AgentId>> {
    let params = config.boid_params();
    crate::flocking::validate_params(&params)?;
    let bounds = params.bounds;
    let y = config.world.spawn_height;

    let mut ids = Vec::with_capacity(config.world.agent_count);
    for _ in 0..config.world.agent_count {
        let position = Vec3::new(
            rng.gen_range(-bounds.x..bounds.x),
            y,
            rng.gen_range(-bounds.z..bounds.z),
        );
        let mut agent = Agent::new(position, params).with_velocity(random_heading(rng));
        agent.flee_target = nearest_spawn(position, &config.predator.spawn_points);
        ids.push(registry.spawn(agent));
    }
    tracing::info!(agents = ids.len(), "flock spawned");
    Ok(ids)
}

fn nearest_spawn(position: Vec3, spawns: &[Vec3]) -> Option<PredatorId> {
    spawns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            position
                .distance_squared(**a)
                .total_cmp(&position.distance_squared(**b))
        })
        .map(|(i, _)| PredatorId(i as u32))
}

/// Builds a validated predator in Patrol with its first waypoint chosen.
pub fn create_predator(id: PredatorId, position: Vec3, config: &SimConfig) -> Result<Predator> {
    let p = &config.predator;
    let mut predator = Predator::new(id, position, p.waypoints.clone(), p.params);
    validate_predator(&predator)?;
    predator.waypoint =
        waypoints::closest_in_range(position, &predator.waypoints, p.params.patrol_range);
    tracing::debug!(predator = %id, ?position, waypoint = ?predator.waypoint, "predator created");
    Ok(predator)
}

/// One predator per configured spawn point; ids follow spawn order.
pub fn spawn_predators(config: &SimConfig) -> Result<Vec<Predator>> {
    config
        .predator
        .spawn_points
        .iter()
        .enumerate()
        .map(|(i, &pos)| create_predator(PredatorId(i as u32), pos, config))
        .collect()
}
