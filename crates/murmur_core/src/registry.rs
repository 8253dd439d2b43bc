//! Agent registry: a generational arena of boids plus the ordered list of
//! agents that currently take part in the simulation.
//!
//! Killing an agent flips its `alive` flag and unregisters it, but the slot
//! survives until [`AgentRegistry::reap_dead`] runs so that anything still
//! holding the handle can observe the death instead of dangling.

use glam::Vec3;
use murmur_data::{Agent, AgentId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    registered: bool,
    agent: Option<Agent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentRegistry {
    slots: Vec<Slot>,
    order: Vec<AgentId>,
    free: Vec<u32>,
}

impl AgentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Stores `agent`, assigns its id and registers it.
    pub fn spawn(&mut self, mut agent: Agent) -> AgentId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                AgentId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    registered: false,
                    agent: None,
                });
                AgentId::new((self.slots.len() - 1) as u32, 0)
            }
        };
        agent.id = id;
        self.slots[id.index as usize].agent = Some(agent);
        self.add(id);
        id
    }

    fn slot(&self, id: AgentId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation && s.agent.is_some())
    }

    fn slot_mut(&mut self, id: AgentId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation && s.agent.is_some())
    }

    /// Registers a stored, live agent. Adding twice is a no-op; dead or stale
    /// handles are ignored. Returns whether the agent is registered afterwards.
    pub fn add(&mut self, id: AgentId) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        if !slot.agent.as_ref().is_some_and(|a| a.alive) {
            return false;
        }
        if !slot.registered {
            slot.registered = true;
            self.order.push(id);
        }
        true
    }

    /// Unregisters an agent. No-op when absent.
    pub fn remove(&mut self, id: AgentId) {
        if let Some(slot) = self.slot_mut(id) {
            if slot.registered {
                slot.registered = false;
                self.order.retain(|&other| other != id);
            }
        }
    }

    /// Marks the agent dead and unregisters it. Returns `true` only if a
    /// live agent was actually killed.
    pub fn kill(&mut self, id: AgentId) -> bool {
        let killed = match self.slot_mut(id).and_then(|s| s.agent.as_mut()) {
            Some(agent) if agent.alive => {
                agent.alive = false;
                agent.marked = false;
                true
            }
            _ => false,
        };
        if killed {
            self.remove(id);
        }
        killed
    }

    /// Frees the slots of dead agents. Their handles stop resolving.
    /// Returns how many slots were freed.
    pub fn reap_dead(&mut self) -> usize {
        let mut reaped = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.agent.as_ref().is_some_and(|a| !a.alive) {
                slot.agent = None;
                slot.registered = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                reaped += 1;
            }
        }
        reaped
    }

    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.slot(id).and_then(|s| s.agent.as_ref())
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.slot_mut(id).and_then(|s| s.agent.as_mut())
    }

    #[must_use]
    pub fn is_alive(&self, id: AgentId) -> bool {
        self.get(id).is_some_and(|a| a.alive)
    }

    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.slot(id).is_some_and(|s| s.registered)
    }

    /// Position of a live agent.
    #[must_use]
    pub fn live_position(&self, id: AgentId) -> Option<Vec3> {
        self.get(id).filter(|a| a.alive).map(|a| a.position)
    }

    /// Sets the marked flag. Returns `true` if the flag changed.
    pub fn set_marked(&mut self, id: AgentId, marked: bool) -> bool {
        match self.get_mut(id) {
            Some(agent) if agent.alive && agent.marked != marked => {
                agent.marked = marked;
                true
            }
            _ => false,
        }
    }

    /// Clears the marked flag on every registered agent, returning the ids
    /// whose flag actually changed.
    pub fn clear_all_marks(&mut self) -> Vec<AgentId> {
        let mut cleared = Vec::new();
        for i in 0..self.order.len() {
            let id = self.order[i];
            if self.set_marked(id, false) {
                cleared.push(id);
            }
        }
        cleared
    }

    /// Registered agents in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Agent> + Clone + '_ {
        self.order.iter().filter_map(move |&id| self.get(id))
    }

    #[must_use]
    pub fn ids(&self) -> &[AgentId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of stored agents, dead ones awaiting reaping included.
    #[must_use]
    pub fn stored(&self) -> usize {
        self.slots.iter().filter(|s| s.agent.is_some()).count()
    }
}
