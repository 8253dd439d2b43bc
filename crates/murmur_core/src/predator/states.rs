//! Per-state handlers. Each one takes the predator and the hunt context and
//! may call [`transition`] synchronously.

use super::fsm::transition;
use super::waypoints;
use super::HuntContext;
use crate::error::Result;
use crate::steering::{horizontal, normalize_or_zero, EPSILON_SQ};
use glam::Vec3;
use murmur_data::{AgentId, Predator, PredatorState};

fn spend_energy(predator: &mut Predator, multiplier: f32, dt: f32) {
    predator.energy = (predator.energy - dt * multiplier).clamp(0.0, predator.params.max_energy);
}

/// Moves straight at `target`, never overshooting it.
fn move_towards(predator: &mut Predator, target: Vec3, speed: f32, dt: f32) {
    let offset = target - predator.position;
    let distance = offset.length();
    if distance * distance <= EPSILON_SQ {
        return;
    }
    predator.forward = offset / distance;
    predator.position += predator.forward * (speed * dt).min(distance);
}

/// Nearest live agent among `candidates`.
fn nearest_live(
    ctx: &HuntContext<'_>,
    origin: Vec3,
    candidates: &[AgentId],
) -> Option<(AgentId, Vec3, f32)> {
    let mut best: Option<(AgentId, Vec3, f32)> = None;
    for &id in candidates {
        if let Some(pos) = ctx.registry.live_position(id) {
            let d = origin.distance(pos);
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((id, pos, d));
            }
        }
    }
    best
}

fn live_agents_in_box(ctx: &HuntContext<'_>, center: Vec3, half_extent: f32) -> Vec<AgentId> {
    let half = Vec3::new(half_extent, 0.0, half_extent);
    let registry = &*ctx.registry;
    ctx.spatial
        .region_query(center - half, center + half, &mut |id| registry.is_alive(id))
}

/// Live agents the predator may hunt from where it stands. Patrol only
/// escalates for agents in this set, and Chase picks its first prey from it.
fn hunt_candidates(ctx: &HuntContext<'_>, predator: &Predator) -> Vec<AgentId> {
    live_agents_in_box(ctx, predator.position, predator.params.hunt_box_half_extent)
}

/// Drops the hunt and falls back to `to`.
fn abandon_hunt(predator: &mut Predator, to: PredatorState, ctx: &mut HuntContext<'_>) -> Result<()> {
    predator.current_target = None;
    transition(predator, to, ctx)
}

pub fn idle_enter(predator: &mut Predator, ctx: &mut HuntContext<'_>) -> Result<()> {
    if predator.is_exhausted() {
        transition(predator, PredatorState::Rest, ctx)
    } else {
        transition(predator, PredatorState::Patrol, ctx)
    }
}

pub fn patrol_enter(predator: &mut Predator, _ctx: &mut HuntContext<'_>) -> Result<()> {
    predator.waypoint = waypoints::closest_in_range(
        predator.position,
        &predator.waypoints,
        predator.params.patrol_range,
    );
    if predator.waypoint.is_none() {
        tracing::debug!(predator = %predator.id, "no waypoint within patrol range");
    }
    Ok(())
}

pub fn patrol_tick(predator: &mut Predator, ctx: &mut HuntContext<'_>) -> Result<()> {
    let p = predator.params;
    let dt = ctx.dt;

    let candidates = hunt_candidates(ctx, predator);
    let spotted = candidates.iter().any(|&id| {
        ctx.registry.live_position(id).is_some_and(|pos| {
            let d = predator.position.distance(pos);
            d <= p.patrol_range
                && d <= p.min_chase_distance
                && ctx.sight.has_clear_path(predator.position, pos)
        })
    });
    if spotted {
        return transition(predator, PredatorState::Chase, ctx);
    }

    if predator.waypoint.is_none() {
        predator.waypoint =
            waypoints::closest_in_range(predator.position, &predator.waypoints, p.patrol_range);
    }
    if let (Some(index), Some(target)) = (predator.waypoint, predator.current_waypoint()) {
        move_towards(predator, target, p.patrol_speed, dt);
        if predator.position.distance(target) <= p.min_patrol_distance {
            let (next, direction) =
                waypoints::next_index(index, predator.waypoints.len(), predator.direction);
            predator.waypoint = Some(next);
            predator.direction = direction;
        }
    }

    spend_energy(predator, p.patrol_energy_multiplier, dt);
    if predator.is_exhausted() {
        return abandon_hunt(predator, PredatorState::Rest, ctx);
    }
    Ok(())
}

pub fn chase_enter(predator: &mut Predator, ctx: &mut HuntContext<'_>) -> Result<()> {
    let p = predator.params;
    predator.target_set.clear();

    let candidates = hunt_candidates(ctx, predator);
    let Some((first, first_pos, _)) = nearest_live(ctx, predator.position, &candidates) else {
        return abandon_hunt(predator, PredatorState::Patrol, ctx);
    };

    // Everyone sharing the prey's bucket becomes part of the hunt.
    let key = ctx.spatial.bucket_of(first_pos);
    let mut targets: Vec<AgentId> = if ctx.spatial.is_valid_bucket(key) {
        ctx.spatial
            .agents_in(key)
            .iter()
            .copied()
            .filter(|&id| ctx.registry.is_alive(id))
            .collect()
    } else {
        Vec::new()
    };
    if !targets.contains(&first) {
        targets.push(first);
    }
    for &id in &targets {
        if ctx.registry.set_marked(id, true) {
            ctx.observer.on_agent_marked(id, true);
        }
    }
    predator.target_set = targets;
    predator.current_target = Some(first);

    // Push the rest of the flock away from the hunt.
    let bystanders = live_agents_in_box(ctx, predator.position, p.evade_region_half_extent);
    let mut pushed = 0usize;
    for id in bystanders {
        if predator.target_set.contains(&id) {
            continue;
        }
        if let Some(agent) = ctx.registry.get_mut(id) {
            let mut away = normalize_or_zero(horizontal(agent.position - predator.position));
            if away == Vec3::ZERO {
                away = normalize_or_zero(horizontal(predator.forward));
            }
            agent.impulse = away * p.evade_force;
            pushed += 1;
        }
    }
    tracing::debug!(
        predator = %predator.id,
        prey = %first,
        targets = predator.target_set.len(),
        pushed,
        "hunt started"
    );
    Ok(())
}

pub fn chase_tick(predator: &mut Predator, ctx: &mut HuntContext<'_>) -> Result<()> {
    let p = predator.params;
    let dt = ctx.dt;

    let registry = &*ctx.registry;
    predator.target_set.retain(|&id| registry.is_alive(id));
    if predator.target_set.is_empty() {
        return abandon_hunt(predator, PredatorState::Patrol, ctx);
    }

    let nearest = nearest_live(ctx, predator.position, &predator.target_set);
    predator.current_target = nearest.map(|(id, _, _)| id);
    let Some((target, target_pos, distance)) = nearest else {
        return abandon_hunt(predator, PredatorState::Patrol, ctx);
    };
    if distance > p.min_chase_distance + p.chase_slack {
        return abandon_hunt(predator, PredatorState::Patrol, ctx);
    }

    move_towards(predator, target_pos, p.chase_speed, dt);
    spend_energy(predator, p.chase_energy_multiplier, dt);
    // A prey in reach is still taken on the tick that drains the last energy;
    // Idle then sends the predator to Rest.
    if predator.position.distance(target_pos) <= p.min_attack_distance
        && ctx.registry.is_alive(target)
    {
        return transition(predator, PredatorState::Attack, ctx);
    }
    if predator.is_exhausted() {
        return abandon_hunt(predator, PredatorState::Rest, ctx);
    }
    Ok(())
}

pub fn chase_exit(predator: &mut Predator, ctx: &mut HuntContext<'_>) -> Result<()> {
    for id in ctx.registry.clear_all_marks() {
        ctx.observer.on_agent_marked(id, false);
    }
    predator.target_set.clear();
    Ok(())
}

pub fn attack_enter(predator: &mut Predator, ctx: &mut HuntContext<'_>) -> Result<()> {
    if let Some(prey) = predator.current_target.take() {
        if ctx.registry.kill(prey) {
            tracing::info!(predator = %predator.id, %prey, "kill");
            ctx.observer.on_agent_killed(prey, predator.id);
            if let Some(metrics) = ctx.metrics {
                metrics.record_kill();
            }
        }
    }
    transition(predator, PredatorState::Idle, ctx)
}

pub fn rest_tick(predator: &mut Predator, ctx: &mut HuntContext<'_>) -> Result<()> {
    let max = predator.params.max_energy;
    predator.energy =
        (predator.energy + ctx.dt * predator.params.rest_regen_multiplier).clamp(0.0, max);
    if predator.energy >= max {
        return transition(predator, PredatorState::Idle, ctx);
    }
    Ok(())
}
