//! Predator behaviour: a five-state machine (Idle, Patrol, Chase, Attack,
//! Rest) driven by energy, line of sight and spatial queries against the
//! flock.
//!
//! Each state is a row of plain handler functions in [`fsm`]; the handlers
//! live in [`states`]. Everything a handler may touch is passed in through
//! [`HuntContext`].

pub mod fsm;
pub mod states;
pub mod waypoints;

use crate::ensure_precondition;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::observer::SimObserver;
use crate::registry::AgentRegistry;
use crate::sight::LineOfSight;
use crate::spatial_hash::SpatialIndex;
use murmur_data::{Predator, PredatorParams};

pub use fsm::{can_transition, handlers, successors, tick, transition, StateHandlers};

/// The world as one predator sees it during its update.
///
/// Registry mutations (marks, kills) are visible to every later read in the
/// same tick. The spatial index is a position snapshot, so handlers re-check
/// liveness through the registry before trusting a query result.
pub struct HuntContext<'a> {
    pub registry: &'a mut AgentRegistry,
    pub spatial: &'a dyn SpatialIndex,
    pub sight: &'a dyn LineOfSight,
    pub observer: &'a mut dyn SimObserver,
    pub metrics: Option<&'a Metrics>,
    pub dt: f32,
}

/// Rejects predator configurations the state machine cannot run with.
pub fn validate_predator(predator: &Predator) -> Result<()> {
    ensure_precondition!(
        !predator.waypoints.is_empty(),
        "{} has no patrol waypoints",
        predator.id
    );
    ensure_precondition!(
        predator.waypoints.iter().all(|w| w.is_finite()),
        "{} has non-finite waypoints",
        predator.id
    );
    validate_params(&predator.params)?;
    ensure_precondition!(
        predator.energy.is_finite()
            && (0.0..=predator.params.max_energy).contains(&predator.energy),
        "{} energy {} outside [0, {}]",
        predator.id,
        predator.energy,
        predator.params.max_energy
    );
    Ok(())
}

pub fn validate_params(p: &PredatorParams) -> Result<()> {
    ensure_precondition!(
        p.max_energy.is_finite() && p.max_energy > 0.0,
        "max_energy must be positive, got {}",
        p.max_energy
    );
    ensure_precondition!(
        p.patrol_speed > 0.0 && p.chase_speed > 0.0,
        "patrol and chase speeds must be positive"
    );
    ensure_precondition!(
        p.patrol_range >= 0.0
            && p.min_patrol_distance >= 0.0
            && p.min_chase_distance >= 0.0
            && p.chase_slack >= 0.0
            && p.min_attack_distance >= 0.0
            && p.hunt_box_half_extent >= 0.0
            && p.evade_region_half_extent >= 0.0,
        "ranges must be non-negative"
    );
    ensure_precondition!(
        p.patrol_energy_multiplier >= 0.0
            && p.chase_energy_multiplier >= 0.0
            && p.evade_force >= 0.0,
        "multipliers must be non-negative"
    );
    ensure_precondition!(
        p.rest_regen_multiplier > 0.0,
        "rest_regen_multiplier must be positive or Rest never ends"
    );
    ensure_precondition!(
        p.hunt_box_half_extent >= p.min_chase_distance,
        "hunt_box_half_extent {} must cover min_chase_distance {}",
        p.hunt_box_half_extent,
        p.min_chase_distance
    );
    Ok(())
}

/// Drops dead agents from the target set and re-selects the current target
/// as the nearest surviving member. Returns `true` if anything changed.
///
/// Run after every predator has ticked: a kill by a later predator can
/// invalidate the hunt of one that already moved this tick.
pub fn drop_dead_targets(predator: &mut Predator, registry: &AgentRegistry) -> bool {
    let before = predator.target_set.len();
    predator.target_set.retain(|&id| registry.is_alive(id));
    if predator.target_set.len() == before
        && predator.current_target.map_or(true, |t| registry.is_alive(t))
    {
        return false;
    }
    predator.current_target = predator
        .target_set
        .iter()
        .filter_map(|&id| registry.live_position(id).map(|pos| (id, pos)))
        .min_by(|(_, a), (_, b)| {
            predator
                .position
                .distance_squared(*a)
                .total_cmp(&predator.position.distance_squared(*b))
        })
        .map(|(id, _)| id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use murmur_data::{Agent, BoidParams, PredatorId, PredatorState};

    #[test]
    fn test_hunt_box_must_cover_chase_distance() {
        assert!(validate_params(&PredatorParams::default()).is_ok());
        let narrow = PredatorParams {
            hunt_box_half_extent: 5.0,
            min_chase_distance: 10.0,
            ..Default::default()
        };
        assert!(validate_params(&narrow).is_err());
    }

    #[test]
    fn test_drop_dead_targets_reselects_nearest_survivor() {
        let mut registry = AgentRegistry::new();
        let near = registry.spawn(Agent::new(Vec3::new(1.0, 0.0, 0.0), BoidParams::default()));
        let far = registry.spawn(Agent::new(Vec3::new(3.0, 0.0, 0.0), BoidParams::default()));
        let mut predator = Predator::new(
            PredatorId(0),
            Vec3::ZERO,
            vec![Vec3::ZERO],
            PredatorParams::default(),
        );
        predator.state = PredatorState::Chase;
        predator.target_set = vec![near, far];
        predator.current_target = Some(near);

        assert!(!drop_dead_targets(&mut predator, &registry));

        registry.kill(near);
        assert!(drop_dead_targets(&mut predator, &registry));
        assert_eq!(predator.target_set, vec![far]);
        assert_eq!(predator.current_target, Some(far));

        registry.kill(far);
        assert!(drop_dead_targets(&mut predator, &registry));
        assert!(predator.target_set.is_empty());
        assert_eq!(predator.current_target, None);
    }
}
