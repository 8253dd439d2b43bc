//! Serializable views of the simulation for hosts that render or record runs.

use crate::registry::AgentRegistry;
use glam::Vec3;
use murmur_data::{AgentId, Predator, PredatorId, PredatorState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub marked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredatorSnapshot {
    pub id: PredatorId,
    pub position: Vec3,
    pub state: PredatorState,
    pub energy: f32,
    pub target: Option<AgentId>,
}

impl From<&Predator> for PredatorSnapshot {
    fn from(p: &Predator) -> Self {
        Self {
            id: p.id,
            position: p.position,
            state: p.state,
            energy: p.energy,
            target: p.current_target,
        }
    }
}

/// Live agents and all predators at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub tick: u64,
    pub agents: Vec<AgentSnapshot>,
    pub predators: Vec<PredatorSnapshot>,
}

impl SimulationSnapshot {
    #[must_use]
    pub fn capture(tick: u64, registry: &AgentRegistry, predators: &[Predator]) -> Self {
        Self {
            tick,
            agents: registry
                .all()
                .filter(|a| a.alive)
                .map(|a| AgentSnapshot {
                    id: a.id,
                    position: a.position,
                    velocity: a.velocity,
                    marked: a.marked,
                })
                .collect(),
            predators: predators.iter().map(PredatorSnapshot::from).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.agents.iter().filter(|a| a.marked).count()
    }
}
