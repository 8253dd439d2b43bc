//! Per-agent steering: separation, alignment, cohesion, arrive and evade.
//!
//! Evasion preempts flocking: an agent whose flee target is inside its evade
//! radius only flees that tick. Every contribution is clamped to `max_force`
//! before weighting, and the resulting velocity is clamped to `max_speed`.

use crate::ensure_precondition;
use crate::error::Result;
use crate::registry::AgentRegistry;
use crate::spatial_hash::{SpatialHash, SpatialIndex};
use crate::steering::{
    arrive, clamp_magnitude, flee, horizontal, normalize_or_zero, steer_towards, wrap_position,
    EPSILON_SQ,
};
use glam::Vec3;
use murmur_data::{Agent, AgentId, BoidParams};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

fn others<'a, I>(id: AgentId, neighbours: I) -> impl Iterator<Item = &'a Agent>
where
    I: IntoIterator<Item = &'a Agent>,
    I::IntoIter: 'a,
{
    neighbours
        .into_iter()
        .filter(move |other| other.id != id && other.alive)
}

/// Steers away from the average horizontal offset of agents closer than
/// `separation_distance`.
pub fn separation<'a, I>(agent: &Agent, neighbours: I) -> Vec3
where
    I: IntoIterator<Item = &'a Agent>,
    I::IntoIter: 'a,
{
    let p = &agent.params;
    let mut sum = Vec3::ZERO;
    let mut count = 0u32;
    for other in others(agent.id, neighbours) {
        let offset = other.position - agent.position;
        if offset.length() < p.separation_distance {
            sum += horizontal(offset);
            count += 1;
        }
    }
    if count == 0 {
        return Vec3::ZERO;
    }
    let desired = -(normalize_or_zero(sum / count as f32) * p.max_speed);
    steer_towards(desired, agent.velocity, p.max_force)
}

/// Steers towards the average heading of agents within `view_distance`.
pub fn alignment<'a, I>(agent: &Agent, neighbours: I) -> Vec3
where
    I: IntoIterator<Item = &'a Agent>,
    I::IntoIter: 'a,
{
    let p = &agent.params;
    let mut sum = Vec3::ZERO;
    let mut count = 0u32;
    for other in others(agent.id, neighbours) {
        if other.position.distance(agent.position) < p.view_distance {
            sum += other.velocity;
            count += 1;
        }
    }
    if count == 0 {
        return Vec3::ZERO;
    }
    let desired = normalize_or_zero(sum / count as f32) * p.max_speed;
    steer_towards(desired, agent.velocity, p.max_force)
}

/// Steers towards the centroid of agents within `view_distance`.
pub fn cohesion<'a, I>(agent: &Agent, neighbours: I) -> Vec3
where
    I: IntoIterator<Item = &'a Agent>,
    I::IntoIter: 'a,
{
    let p = &agent.params;
    let mut sum = Vec3::ZERO;
    let mut count = 0u32;
    for other in others(agent.id, neighbours) {
        if other.position.distance(agent.position) < p.view_distance {
            sum += other.position;
            count += 1;
        }
    }
    if count == 0 {
        return Vec3::ZERO;
    }
    let centroid = sum / count as f32;
    let desired = normalize_or_zero(centroid - agent.position) * p.max_speed;
    steer_towards(desired, agent.velocity, p.max_force)
}

/// `Some(force)` when `threat` is inside the evade radius.
#[must_use]
pub fn evasion(agent: &Agent, threat: Option<Vec3>) -> Option<Vec3> {
    let threat = threat?;
    let p = &agent.params;
    (agent.position.distance(threat) < p.evade_radius)
        .then(|| flee(agent.position, agent.velocity, threat, p.max_speed, p.max_force))
}

/// Total steering force for one tick. Pure: reads `agent` and `neighbours`
/// only.
pub fn steering_force<'a, I>(agent: &Agent, neighbours: I, threat: Option<Vec3>) -> Vec3
where
    I: IntoIterator<Item = &'a Agent> + Clone,
    I::IntoIter: 'a,
{
    if let Some(force) = evasion(agent, threat) {
        return force;
    }
    let p = &agent.params;
    let w = &p.weights;
    let mut force = separation(agent, neighbours.clone()) * w.separation
        + alignment(agent, neighbours.clone()) * w.alignment
        + cohesion(agent, neighbours) * w.cohesion;
    if let Some(target) = agent.seek_target {
        force += arrive(
            agent.position,
            agent.velocity,
            target,
            p.arrive_radius,
            p.max_speed,
            p.max_force,
        ) * w.arrive;
    }
    force
}

/// Applies `force`, integrates the position on the ground plane, turns the
/// agent to face its velocity and wraps it back into the map.
pub fn apply_force(agent: &mut Agent, force: Vec3, dt: f32) {
    let p = agent.params;
    let mut velocity = clamp_magnitude(agent.velocity + force, p.max_speed);
    velocity.y = 0.0;
    agent.velocity = velocity;

    agent.position += horizontal(velocity + agent.impulse) * dt;
    if velocity.length_squared() > EPSILON_SQ {
        agent.forward = velocity.normalize();
    }
    agent.position = wrap_position(agent.position, &p.bounds);

    if agent.impulse != Vec3::ZERO {
        agent.impulse *= p.impulse_damping.clamp(0.0, 1.0).powf(dt);
        if agent.impulse.length_squared() < 1e-6 {
            agent.impulse = Vec3::ZERO;
        }
    }
}

/// Rejects parameters that would turn the steering maths into NaN soup.
pub fn validate_params(params: &BoidParams) -> Result<()> {
    ensure_precondition!(
        params.max_speed.is_finite() && params.max_speed > 0.0,
        "max_speed must be positive, got {}",
        params.max_speed
    );
    ensure_precondition!(
        params.max_force.is_finite() && params.max_force > 0.0,
        "max_force must be positive, got {}",
        params.max_force
    );
    ensure_precondition!(
        params.view_distance >= 0.0
            && params.separation_distance >= 0.0
            && params.evade_radius >= 0.0
            && params.arrive_radius >= 0.0,
        "perception radii must be non-negative"
    );
    ensure_precondition!(
        params.bounds.x > 0.0 && params.bounds.z > 0.0,
        "map bounds must be positive, got {:?}",
        params.bounds
    );
    Ok(())
}

fn validate_dt(dt: f32) -> Result<()> {
    ensure_precondition!(
        dt.is_finite() && dt >= 0.0,
        "dt must be finite and non-negative, got {}",
        dt
    );
    Ok(())
}

/// Advances one agent by one tick against an explicit neighbour list.
pub fn step<'a, I>(agent: &mut Agent, neighbours: I, threat: Option<Vec3>, dt: f32) -> Result<()>
where
    I: IntoIterator<Item = &'a Agent> + Clone,
    I::IntoIter: 'a,
{
    validate_params(&agent.params)?;
    validate_dt(dt)?;
    if !agent.alive {
        return Ok(());
    }
    let force = steering_force(agent, neighbours, threat);
    apply_force(agent, force, dt);
    Ok(())
}

fn neighbour_radius(params: &BoidParams) -> f32 {
    params.view_distance.max(params.separation_distance)
}

fn threat_for(agent: &Agent, threats: &[Vec3]) -> Option<Vec3> {
    agent
        .flee_target
        .and_then(|predator| threats.get(predator.0 as usize).copied())
}

/// Advances every registered agent by one tick.
///
/// Forces are computed against the state at the start of the call (in
/// parallel when rayon is enabled) and only then applied, so no agent ever
/// sees a half-updated neighbour. With a spatial hash, neighbours come from a
/// radius query over a fresh build; without one every registered agent is a
/// candidate. `threats[i]` is the position of predator `i`.
///
/// Returns the number of agents stepped.
pub fn step_all(
    registry: &mut AgentRegistry,
    spatial: Option<&mut SpatialHash>,
    threats: &[Vec3],
    dt: f32,
) -> Result<usize> {
    validate_dt(dt)?;

    let spatial: Option<&SpatialHash> = match spatial {
        Some(hash) => {
            let entries: Vec<(AgentId, Vec3)> =
                registry.all().map(|a| (a.id, a.position)).collect();
            hash.build(&entries);
            Some(&*hash)
        }
        None => None,
    };

    let forces: Vec<(AgentId, Vec3)> = {
        let reg = &*registry;
        let compute = |scratch: &mut Vec<AgentId>, id: &AgentId| -> Result<Option<(AgentId, Vec3)>> {
            let Some(agent) = reg.get(*id).filter(|a| a.alive) else {
                return Ok(None);
            };
            validate_params(&agent.params)?;
            let threat = threat_for(agent, threats);
            let force = match spatial {
                Some(hash) => {
                    hash.query_radius_into(agent.position, neighbour_radius(&agent.params), scratch);
                    let neighbours: Vec<&Agent> =
                        scratch.iter().filter_map(|&n| reg.get(n)).collect();
                    steering_force(agent, neighbours.iter().copied(), threat)
                }
                None => steering_force(agent, reg.all(), threat),
            };
            Ok(Some((*id, force)))
        };

        #[cfg(feature = "rayon")]
        let computed: Result<Vec<Option<(AgentId, Vec3)>>> = reg
            .ids()
            .par_iter()
            .map_init(Vec::new, compute)
            .collect();
        #[cfg(not(feature = "rayon"))]
        let computed: Result<Vec<Option<(AgentId, Vec3)>>> = {
            let mut scratch = Vec::new();
            reg.ids().iter().map(|id| compute(&mut scratch, id)).collect()
        };
        computed?.into_iter().flatten().collect()
    };

    let stepped = forces.len();
    for (id, force) in forces {
        if let Some(agent) = registry.get_mut(id) {
            apply_force(agent, force, dt);
        }
    }
    Ok(stepped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_data::{FlockWeights, MapBounds};

    fn params() -> BoidParams {
        BoidParams {
            max_speed: 5.0,
            max_force: 1.0,
            view_distance: 10.0,
            separation_distance: 3.0,
            evade_radius: 4.0,
            arrive_radius: 2.0,
            impulse_damping: 0.5,
            weights: FlockWeights {
                separation: 1.0,
                alignment: 1.0,
                cohesion: 1.0,
                arrive: 1.0,
            },
            bounds: MapBounds { x: 100.0, z: 100.0 },
        }
    }

    fn agent(index: u32, x: f32, z: f32) -> Agent {
        let mut a = Agent::new(Vec3::new(x, 0.0, z), params());
        a.id = AgentId::new(index, 0);
        a
    }

    #[test]
    fn test_lonely_agent_feels_no_flocking_force() {
        let a = agent(0, 0.0, 0.0).with_velocity(Vec3::new(1.0, 0.0, 0.0));
        let far = agent(1, 50.0, 50.0);
        let all = [a.clone(), far];
        assert_eq!(separation(&a, &all), Vec3::ZERO);
        assert_eq!(alignment(&a, &all), Vec3::ZERO);
        assert_eq!(cohesion(&a, &all), Vec3::ZERO);
        assert_eq!(steering_force(&a, &all, None), Vec3::ZERO);
    }

    #[test]
    fn test_agent_ignores_itself() {
        let a = agent(0, 0.0, 0.0);
        let all = [a.clone()];
        assert_eq!(steering_force(&a, &all, None), Vec3::ZERO);
    }

    #[test]
    fn test_separation_pushes_away() {
        let a = agent(0, 0.0, 0.0);
        let b = agent(1, 1.0, 0.0);
        let f = separation(&a, [&b]);
        assert!(f.x < 0.0);
        assert!(f.length() <= params().max_force + 1e-5);
    }

    #[test]
    fn test_separation_ignores_vertical_offset() {
        let a = agent(0, 0.0, 0.0);
        let mut b = agent(1, 1.0, 0.0);
        b.position.y = 1.0;
        let f = separation(&a, [&b]);
        assert_eq!(f.y, 0.0);
    }

    #[test]
    fn test_cohesion_pulls_towards_centroid() {
        let a = agent(0, 0.0, 0.0);
        let b = agent(1, 6.0, 0.0);
        let c = agent(2, 6.0, 2.0);
        let f = cohesion(&a, [&b, &c]);
        assert!(f.x > 0.0 && f.z > 0.0);
    }

    #[test]
    fn test_alignment_matches_heading() {
        let a = agent(0, 0.0, 0.0);
        let b = agent(1, 5.0, 0.0).with_velocity(Vec3::new(0.0, 0.0, 3.0));
        let f = alignment(&a, [&b]);
        assert!(f.z > 0.0);
        assert!(f.x.abs() < 1e-6);
    }

    #[test]
    fn test_evasion_preempts_flocking() {
        let a = agent(0, 0.0, 0.0);
        let b = agent(1, 1.0, 0.0);
        let threat = Vec3::new(0.0, 0.0, 2.0);
        let f = steering_force(&a, [&b], Some(threat));
        let pure = flee(a.position, a.velocity, threat, 5.0, 1.0);
        assert_eq!(f, pure);
        assert!(f.z < 0.0);
    }

    #[test]
    fn test_threat_outside_radius_is_ignored() {
        let a = agent(0, 0.0, 0.0);
        assert!(evasion(&a, Some(Vec3::new(0.0, 0.0, 4.0))).is_none());
        assert!(evasion(&a, None).is_none());
    }

    #[test]
    fn test_step_clamps_velocity_and_flattens() {
        let mut a = agent(0, 0.0, 0.0).with_velocity(Vec3::new(5.0, 0.0, 0.0));
        let b = agent(1, 4.0, 2.0).with_velocity(Vec3::new(0.0, 0.0, 5.0));
        step(&mut a, [&b], None, 0.1).unwrap();
        assert!(a.velocity.length() <= 5.0 + 1e-4);
        assert_eq!(a.velocity.y, 0.0);
        assert!(a.position.x > 0.0);
    }

    #[test]
    fn test_step_faces_velocity() {
        let mut a = agent(0, 0.0, 0.0).with_velocity(Vec3::new(0.0, 0.0, -2.0));
        step(&mut a, std::iter::empty::<&Agent>(), None, 0.1).unwrap();
        assert!((a.forward - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_step_wraps_at_bound() {
        let mut a = agent(0, 99.9, 0.0).with_velocity(Vec3::new(5.0, 0.0, 0.0));
        step(&mut a, std::iter::empty::<&Agent>(), None, 0.1).unwrap();
        assert_eq!(a.position.x, -100.0);
    }

    #[test]
    fn test_step_rejects_degenerate_limits() {
        let mut a = agent(0, 0.0, 0.0);
        a.params.max_speed = 0.0;
        assert!(step(&mut a, std::iter::empty::<&Agent>(), None, 0.1).is_err());
        let mut b = agent(1, 0.0, 0.0);
        assert!(step(&mut b, std::iter::empty::<&Agent>(), None, f32::NAN).is_err());
    }

    #[test]
    fn test_impulse_moves_and_decays() {
        let mut a = agent(0, 0.0, 0.0);
        a.impulse = Vec3::new(0.0, 0.0, 10.0);
        apply_force(&mut a, Vec3::ZERO, 1.0);
        assert!((a.position.z - 10.0).abs() < 1e-4);
        assert!((a.impulse.z - 5.0).abs() < 1e-4);
        assert_eq!(a.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_arrive_joins_flocking_sum() {
        let mut a = agent(0, 0.0, 0.0);
        a.seek_target = Some(Vec3::new(10.0, 0.0, 0.0));
        let f = steering_force(&a, std::iter::empty::<&Agent>(), None);
        assert!((f - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_step_all_with_and_without_index_agree() {
        let mut with_index = AgentRegistry::new();
        let mut brute = AgentRegistry::new();
        for i in 0..20 {
            let p = Vec3::new((i % 5) as f32 * 1.5, 0.0, (i / 5) as f32 * 1.5);
            let a = Agent::new(p, params()).with_velocity(Vec3::new(1.0, 0.0, 0.5));
            with_index.spawn(a.clone());
            brute.spawn(a);
        }
        let mut hash = SpatialHash::new(5.0, params().bounds).unwrap();
        assert_eq!(step_all(&mut with_index, Some(&mut hash), &[], 0.1).unwrap(), 20);
        assert_eq!(step_all(&mut brute, None, &[], 0.1).unwrap(), 20);
        for (a, b) in with_index.all().zip(brute.all()) {
            assert!((a.position - b.position).length() < 1e-4);
            assert!(a.velocity.length() <= params().max_speed + 1e-4);
        }
    }
}
