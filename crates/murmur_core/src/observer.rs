//! Side-effect notifications for hosts (materials, colours, logs).
//!
//! Observers see what happened; they never feed anything back into the
//! simulation.

use murmur_data::{AgentId, PredatorId, PredatorState};
use serde::{Deserialize, Serialize};

pub trait SimObserver {
    fn on_state_enter(&mut self, _predator: PredatorId, _state: PredatorState) {}

    fn on_agent_marked(&mut self, _agent: AgentId, _marked: bool) {}

    fn on_agent_killed(&mut self, _agent: AgentId, _by: PredatorId) {}
}

/// Forwards notifications to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SimObserver for TracingObserver {
    fn on_state_enter(&mut self, predator: PredatorId, state: PredatorState) {
        tracing::debug!(%predator, %state, "state enter");
    }

    fn on_agent_marked(&mut self, agent: AgentId, marked: bool) {
        tracing::trace!(%agent, marked, "agent mark");
    }

    fn on_agent_killed(&mut self, agent: AgentId, by: PredatorId) {
        tracing::debug!(%agent, predator = %by, "agent killed");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    StateEntered {
        predator: PredatorId,
        state: PredatorState,
    },
    AgentMarked {
        agent: AgentId,
        marked: bool,
    },
    AgentKilled {
        agent: AgentId,
        by: PredatorId,
    },
}

/// Keeps every notification in arrival order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingObserver {
    pub events: Vec<SimEvent>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// States entered by one predator, oldest first.
    #[must_use]
    pub fn states_of(&self, predator: PredatorId) -> Vec<PredatorState> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                SimEvent::StateEntered { predator: p, state } if p == predator => Some(state),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn kills(&self) -> Vec<AgentId> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                SimEvent::AgentKilled { agent, .. } => Some(agent),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl SimObserver for RecordingObserver {
    fn on_state_enter(&mut self, predator: PredatorId, state: PredatorState) {
        self.events.push(SimEvent::StateEntered { predator, state });
    }

    fn on_agent_marked(&mut self, agent: AgentId, marked: bool) {
        self.events.push(SimEvent::AgentMarked { agent, marked });
    }

    fn on_agent_killed(&mut self, agent: AgentId, by: PredatorId) {
        self.events.push(SimEvent::AgentKilled { agent, by });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_filters_by_predator() {
        let mut obs = RecordingObserver::new();
        obs.on_state_enter(PredatorId(0), PredatorState::Chase);
        obs.on_state_enter(PredatorId(1), PredatorState::Rest);
        obs.on_agent_killed(AgentId::new(2, 0), PredatorId(0));
        assert_eq!(obs.states_of(PredatorId(0)), vec![PredatorState::Chase]);
        assert_eq!(obs.kills(), vec![AgentId::new(2, 0)]);
    }
}
