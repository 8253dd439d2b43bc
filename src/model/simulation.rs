use anyhow::Context;
use glam::Vec3;
use murmur_core::config::SimConfig;
use murmur_core::flocking;
use murmur_core::lifecycle::{self, seeded_rng};
use murmur_core::metrics::Metrics;
use murmur_core::observer::{SimObserver, TracingObserver};
use murmur_core::predator::{self, validate_predator, waypoints, HuntContext};
use murmur_core::registry::AgentRegistry;
use murmur_core::sight::LineOfSight;
use murmur_core::snapshot::SimulationSnapshot;
use murmur_core::spatial_hash::SpatialHash;
use murmur_data::{Agent, AgentId, Predator, PredatorId, PredatorState};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

/// One flock, its predators and everything needed to advance them.
///
/// Each [`step`](Self::step) runs the flocking phase for every live agent,
/// rebuilds the spatial index from the new positions and then ticks every
/// predator's state machine in id order.
pub struct Simulation<O: SimObserver = TracingObserver> {
    pub config: SimConfig,
    registry: AgentRegistry,
    predators: Vec<Predator>,
    spatial: SpatialHash,
    sight: Box<dyn LineOfSight>,
    observer: O,
    metrics: Metrics,
    rng: ChaCha8Rng,
    tick: u64,
}

impl Simulation {
    /// Builds a populated world from `config`: `agent_count` boids and one
    /// predator per spawn point, with obstacles as line-of-sight blockers.
    pub fn new(config: SimConfig) -> anyhow::Result<Self> {
        SimulationBuilder::new(config).build()
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Self::new(SimConfig::from_toml(content)?)
    }
}

impl<O: SimObserver> Simulation<O> {
    /// An empty world with caller-provided line of sight and observer.
    pub fn with_parts(
        config: SimConfig,
        sight: Box<dyn LineOfSight>,
        observer: O,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let spatial = SpatialHash::new(config.world.cell_size, config.world.bounds)?;
        let rng = seeded_rng(config.world.seed);
        tracing::info!(fingerprint = %config.fingerprint(), seed = ?config.world.seed, "simulation created");
        Ok(Self {
            registry: AgentRegistry::with_capacity(config.world.agent_count),
            predators: Vec::new(),
            spatial,
            sight,
            observer,
            metrics: Metrics::new(),
            rng,
            tick: 0,
            config,
        })
    }

    /// Spawns `world.agent_count` boids with the simulation's RNG.
    pub fn spawn_flock(&mut self) -> anyhow::Result<Vec<AgentId>> {
        Ok(lifecycle::spawn_flock(
            &mut self.registry,
            &self.config,
            &mut self.rng,
        )?)
    }

    /// Registers `agent` and returns its handle. Agents without a flee target
    /// flee the nearest predator.
    pub fn add_agent(&mut self, mut agent: Agent) -> anyhow::Result<AgentId> {
        flocking::validate_params(&agent.params)?;
        anyhow::ensure!(agent.position.is_finite(), "agent position must be finite");
        anyhow::ensure!(agent.alive, "cannot add a dead agent");
        if agent.flee_target.is_none() {
            agent.flee_target = self.nearest_predator(agent.position);
        }
        Ok(self.registry.spawn(agent))
    }

    /// Adds a predator at `position` using the configured route and tuning.
    pub fn add_predator(&mut self, position: Vec3) -> anyhow::Result<PredatorId> {
        let id = self.next_predator_id()?;
        let predator = lifecycle::create_predator(id, position, &self.config)?;
        self.push_predator(predator);
        Ok(id)
    }

    /// Adds a predator built by the caller. Its id is reassigned; a missing
    /// waypoint is selected the way Patrol does on entry.
    pub fn insert_predator(&mut self, mut predator: Predator) -> anyhow::Result<PredatorId> {
        let id = self.next_predator_id()?;
        predator.id = id;
        validate_predator(&predator)?;
        if predator.state == PredatorState::Patrol && predator.waypoint.is_none() {
            predator.waypoint = waypoints::closest_in_range(
                predator.position,
                &predator.waypoints,
                predator.params.patrol_range,
            );
        }
        self.push_predator(predator);
        Ok(id)
    }

    fn next_predator_id(&self) -> anyhow::Result<PredatorId> {
        let id = u32::try_from(self.predators.len()).context("too many predators")?;
        Ok(PredatorId(id))
    }

    fn push_predator(&mut self, predator: Predator) {
        self.observer.on_state_enter(predator.id, predator.state);
        self.predators.push(predator);
    }

    fn nearest_predator(&self, position: Vec3) -> Option<PredatorId> {
        self.predators
            .iter()
            .min_by(|a, b| {
                position
                    .distance_squared(a.position)
                    .total_cmp(&position.distance_squared(b.position))
            })
            .map(|p| p.id)
    }

    /// Advances the world by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> anyhow::Result<()> {
        let start = Instant::now();

        let threats: Vec<Vec3> = self.predators.iter().map(|p| p.position).collect();
        flocking::step_all(&mut self.registry, Some(&mut self.spatial), &threats, dt)
            .context("flocking phase")?;

        self.rebuild_index();
        for p in &mut self.predators {
            let mut ctx = HuntContext {
                registry: &mut self.registry,
                spatial: &self.spatial,
                sight: &*self.sight,
                observer: &mut self.observer,
                metrics: Some(&self.metrics),
                dt,
            };
            predator::tick(p, &mut ctx).with_context(|| format!("{} in {}", p.id, p.state))?;
        }
        // A later predator may have killed prey an earlier one is chasing.
        for p in &mut self.predators {
            if predator::drop_dead_targets(p, &self.registry) {
                tracing::debug!(predator = %p.id, target = ?p.current_target, "hunt revalidated");
            }
        }

        self.tick += 1;
        self.metrics.record_tick(start.elapsed(), self.registry.len());
        Ok(())
    }

    pub fn step_n(&mut self, steps: usize, dt: f32) -> anyhow::Result<()> {
        for _ in 0..steps {
            self.step(dt)?;
        }
        Ok(())
    }

    /// One step with the configured fixed timestep.
    pub fn step_fixed(&mut self) -> anyhow::Result<()> {
        self.step(self.config.world.fixed_dt)
    }

    fn rebuild_index(&mut self) {
        let entries: Vec<(AgentId, Vec3)> =
            self.registry.all().map(|a| (a.id, a.position)).collect();
        self.spatial.build(&entries);
    }

    /// Frees the slots of killed agents. Their handles never resolve again.
    pub fn reap_dead(&mut self) -> usize {
        let reaped = self.registry.reap_dead();
        tracing::debug!(reaped, stored = self.registry.stored(), "reaped dead agents");
        reaped
    }

    /// Hash of the whole world state, for checking that two runs agree.
    #[must_use]
    pub fn state_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.tick.to_le_bytes());
        for agent in self.registry.all() {
            hasher.update(agent.id.index.to_le_bytes());
            hasher.update(agent.id.generation.to_le_bytes());
            // Bits, not values, so -0.0 and NaN payloads count too
            for v in [agent.position, agent.velocity, agent.impulse] {
                for c in v.to_array() {
                    hasher.update(c.to_bits().to_le_bytes());
                }
            }
            hasher.update([u8::from(agent.marked)]);
        }
        for p in &self.predators {
            hasher.update(p.id.0.to_le_bytes());
            hasher.update(p.state.name().as_bytes());
            hasher.update(p.energy.to_bits().to_le_bytes());
            for c in p.position.to_array() {
                hasher.update(c.to_bits().to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }

    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot::capture(self.tick, &self.registry, &self.predators)
    }

    #[must_use]
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Direct access for hosts that move or re-target agents between steps.
    pub fn registry_mut(&mut self) -> &mut AgentRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn predators(&self) -> &[Predator] {
        &self.predators
    }

    #[must_use]
    pub fn predator(&self, id: PredatorId) -> Option<&Predator> {
        self.predators.get(id.0 as usize)
    }

    #[must_use]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.registry.len()
    }
}

/// Assembles a [`Simulation`], optionally with a custom line of sight or
/// observer, and either populated from config or empty.
pub struct SimulationBuilder<O: SimObserver = TracingObserver> {
    config: SimConfig,
    sight: Option<Box<dyn LineOfSight>>,
    observer: O,
    populate: bool,
}

impl SimulationBuilder {
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            sight: None,
            observer: TracingObserver,
            populate: true,
        }
    }
}

impl<O: SimObserver> SimulationBuilder<O> {
    #[must_use]
    pub fn observer<P: SimObserver>(self, observer: P) -> SimulationBuilder<P> {
        SimulationBuilder {
            config: self.config,
            sight: self.sight,
            observer,
            populate: self.populate,
        }
    }

    #[must_use]
    pub fn sight<L: LineOfSight + 'static>(mut self, sight: L) -> Self {
        self.sight = Some(Box::new(sight));
        self
    }

    /// Skip spawning the configured flock and predators.
    #[must_use]
    pub fn empty(mut self) -> Self {
        self.populate = false;
        self
    }

    pub fn build(self) -> anyhow::Result<Simulation<O>> {
        let sight: Box<dyn LineOfSight> = match self.sight {
            Some(sight) => sight,
            None => Box::new(self.config.sight()),
        };
        let mut sim = Simulation::with_parts(self.config, sight, self.observer)?;
        if self.populate {
            for predator in lifecycle::spawn_predators(&sim.config)? {
                sim.insert_predator(predator)?;
            }
            sim.spawn_flock()?;
        }
        Ok(sim)
    }
}
