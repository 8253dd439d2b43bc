pub mod macros;

use glam::Vec3;
use murmur_core::observer::RecordingObserver;
use murmur_core::sight::SphereObstacle;
use murmur_data::{Agent, AgentId, PredatorId};
use murmur_lib::model::config::SimConfig;
use murmur_lib::{Simulation, SimulationBuilder};

pub type TestSim = Simulation<RecordingObserver>;

/// Builds a small world from explicit parts: no random flock and no configured
/// predators unless asked for.
#[allow(dead_code)]
pub struct SimBuilder {
    config: SimConfig,
    agents: Vec<(Vec3, Vec3)>,
    predators: Vec<Vec3>,
    obstacles: Vec<SphereObstacle>,
}

#[allow(dead_code)]
impl SimBuilder {
    pub fn new() -> Self {
        let mut config = SimConfig::default();
        config.world.agent_count = 0;
        config.world.seed = Some(0);
        config.predator.spawn_points.clear();
        Self {
            config,
            agents: Vec::new(),
            predators: Vec::new(),
            obstacles: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_agent(mut self, position: Vec3, velocity: Vec3) -> Self {
        self.agents.push((position, velocity));
        self
    }

    pub fn with_predator(mut self, position: Vec3) -> Self {
        self.predators.push(position);
        self
    }

    pub fn with_obstacle(mut self, center: Vec3, radius: f32) -> Self {
        self.obstacles.push(SphereObstacle { center, radius });
        self
    }

    /// Predators are added before agents so every agent flees its nearest
    /// predator. Returns the agent handles in insertion order.
    pub fn build(mut self) -> (TestSim, Vec<AgentId>, Vec<PredatorId>) {
        self.config.obstacles = self.obstacles;
        let mut sim = SimulationBuilder::new(self.config)
            .observer(RecordingObserver::new())
            .empty()
            .build()
            .expect("Failed to build simulation");

        let predators = self
            .predators
            .into_iter()
            .map(|p| sim.add_predator(p).expect("Failed to add predator"))
            .collect();
        let params = sim.config.boid_params();
        let agents = self
            .agents
            .into_iter()
            .map(|(pos, vel)| {
                sim.add_agent(Agent::new(pos, params).with_velocity(vel))
                    .expect("Failed to add agent")
            })
            .collect();
        (sim, agents, predators)
    }
}

/// A seeded, populated world built from the default config.
#[allow(dead_code)]
pub fn seeded_world(seed: u64, agent_count: usize) -> TestSim {
    let mut config = SimConfig::default();
    config.world.seed = Some(seed);
    config.world.agent_count = agent_count;
    SimulationBuilder::new(config)
        .observer(RecordingObserver::new())
        .build()
        .expect("Failed to build seeded world")
}
