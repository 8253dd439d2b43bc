use super::agent::{AgentId, PredatorId};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Behaviour states of a predator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PredatorState {
    Idle,
    #[default]
    Patrol,
    Chase,
    Attack,
    Rest,
}

impl PredatorState {
    pub const ALL: [PredatorState; 5] = [
        PredatorState::Idle,
        PredatorState::Patrol,
        PredatorState::Chase,
        PredatorState::Attack,
        PredatorState::Rest,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            PredatorState::Idle => "IDLE",
            PredatorState::Patrol => "PATROL",
            PredatorState::Chase => "CHASE",
            PredatorState::Attack => "ATTACK",
            PredatorState::Rest => "REST",
        }
    }
}

impl fmt::Display for PredatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction a predator walks its waypoint list in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TraversalDirection {
    #[default]
    Forward,
    Backward,
}

impl TraversalDirection {
    #[must_use]
    pub const fn sign(self) -> isize {
        match self {
            TraversalDirection::Forward => 1,
            TraversalDirection::Backward => -1,
        }
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            TraversalDirection::Forward => TraversalDirection::Backward,
            TraversalDirection::Backward => TraversalDirection::Forward,
        }
    }
}

/// Per-state speeds, ranges and energy multipliers of a predator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorParams {
    pub max_energy: f32,

    pub patrol_speed: f32,
    /// Radius for waypoint selection and for prey detection while patrolling.
    pub patrol_range: f32,
    /// Distance at which a waypoint counts as reached.
    pub min_patrol_distance: f32,
    pub patrol_energy_multiplier: f32,

    pub chase_speed: f32,
    pub min_chase_distance: f32,
    /// Extra distance tolerated before a chase is abandoned.
    pub chase_slack: f32,
    pub chase_energy_multiplier: f32,
    /// Half extent of the box searched for prey, both when spotting it from
    /// Patrol and when a chase starts. Never smaller than `min_chase_distance`.
    pub hunt_box_half_extent: f32,
    /// Half extent of the box whose non-targeted agents get pushed away.
    pub evade_region_half_extent: f32,
    /// Magnitude of the bulk-evade impulse.
    pub evade_force: f32,

    pub min_attack_distance: f32,

    pub rest_regen_multiplier: f32,
}

impl Default for PredatorParams {
    fn default() -> Self {
        Self {
            max_energy: 20.0,
            patrol_speed: 4.0,
            patrol_range: 30.0,
            min_patrol_distance: 0.5,
            patrol_energy_multiplier: 1.0,
            chase_speed: 8.0,
            min_chase_distance: 10.0,
            chase_slack: 2.0,
            chase_energy_multiplier: 3.0,
            hunt_box_half_extent: 10.0,
            evade_region_half_extent: 15.0,
            evade_force: 25.0,
            min_attack_distance: 1.0,
            rest_regen_multiplier: 5.0,
        }
    }
}

/// A hunting agent driven by the five-state behaviour machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predator {
    pub id: PredatorId,
    pub position: Vec3,
    pub forward: Vec3,
    /// Always within `[0, params.max_energy]`.
    pub energy: f32,
    pub state: PredatorState,
    /// `None` when no waypoint lies within patrol range.
    pub waypoint: Option<usize>,
    pub direction: TraversalDirection,
    pub current_target: Option<AgentId>,
    pub target_set: Vec<AgentId>,
    pub waypoints: Vec<Vec3>,
    pub params: PredatorParams,
}

impl Predator {
    /// Raw constructor with full energy in the Patrol state. No waypoint is
    /// selected yet; the state machine does that on entry.
    #[must_use]
    pub fn new(id: PredatorId, position: Vec3, waypoints: Vec<Vec3>, params: PredatorParams) -> Self {
        Self {
            id,
            position,
            forward: Vec3::Z,
            energy: params.max_energy,
            state: PredatorState::Patrol,
            waypoint: None,
            direction: TraversalDirection::Forward,
            current_target: None,
            target_set: Vec::new(),
            waypoints,
            params,
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.energy <= 0.0
    }

    #[must_use]
    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.waypoint.and_then(|i| self.waypoints.get(i).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_predator_starts_full_in_patrol() {
        let p = Predator::new(PredatorId(0), Vec3::ZERO, vec![Vec3::X], PredatorParams::default());
        assert_eq!(p.state, PredatorState::Patrol);
        assert_eq!(p.energy, p.params.max_energy);
        assert!(p.current_target.is_none());
        assert!(p.current_waypoint().is_none());
    }

    #[test]
    fn test_direction_reversal() {
        let d = TraversalDirection::Forward;
        assert_eq!(d.sign(), 1);
        assert_eq!(d.reversed().sign(), -1);
        assert_eq!(d.reversed().reversed(), d);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(PredatorState::Chase.to_string(), "CHASE");
        assert_eq!(PredatorState::ALL.len(), 5);
    }
}
