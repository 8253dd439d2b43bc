//! Run counters and logging setup.
//!
//! Counters are atomics so a shared `&Metrics` can be handed to every
//! predator of a tick without further plumbing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Simulation-wide counters.
pub struct Metrics {
    tick_count: AtomicU64,
    live_agents: AtomicU64,
    kills: AtomicU64,
    transitions: AtomicU64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            live_agents: AtomicU64::new(0),
            kills: AtomicU64::new(0),
            transitions: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick with its duration.
    pub fn record_tick(&self, duration: Duration, live_agents: usize) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        self.live_agents.store(live_agents as u64, Ordering::Relaxed);

        // Log at info level every 1000 ticks
        let tick = self.tick_count.load(Ordering::Relaxed);
        if tick % 1000 == 0 {
            tracing::info!(
                tick = tick,
                live_agents = live_agents,
                kills = self.kills(),
                duration_us = duration.as_micros() as u64,
                elapsed_ms = self.elapsed().as_millis() as u64,
                "Simulation tick"
            );
        }
    }

    pub fn record_kill(&self) {
        self.kills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn live_agents(&self) -> u64 {
        self.live_agents.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn kills(&self) -> u64 {
        self.kills.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Initialize tracing subscriber for logging. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}
