use super::states;
use super::HuntContext;
use crate::ensure_precondition;
use crate::error::{CoreError, Result};
use murmur_data::{Predator, PredatorState};

pub type Handler = fn(&mut Predator, &mut HuntContext<'_>) -> Result<()>;

/// Enter / tick / exit behaviour of one state. `None` means nothing to do.
pub struct StateHandlers {
    pub on_enter: Option<Handler>,
    pub on_tick: Option<Handler>,
    pub on_exit: Option<Handler>,
}

static IDLE: StateHandlers = StateHandlers {
    on_enter: Some(states::idle_enter),
    on_tick: None,
    on_exit: None,
};

static PATROL: StateHandlers = StateHandlers {
    on_enter: Some(states::patrol_enter),
    on_tick: Some(states::patrol_tick),
    on_exit: None,
};

static CHASE: StateHandlers = StateHandlers {
    on_enter: Some(states::chase_enter),
    on_tick: Some(states::chase_tick),
    on_exit: Some(states::chase_exit),
};

static ATTACK: StateHandlers = StateHandlers {
    on_enter: Some(states::attack_enter),
    on_tick: None,
    on_exit: None,
};

static REST: StateHandlers = StateHandlers {
    on_enter: None,
    on_tick: Some(states::rest_tick),
    on_exit: None,
};

#[must_use]
pub fn handlers(state: PredatorState) -> &'static StateHandlers {
    match state {
        PredatorState::Idle => &IDLE,
        PredatorState::Patrol => &PATROL,
        PredatorState::Chase => &CHASE,
        PredatorState::Attack => &ATTACK,
        PredatorState::Rest => &REST,
    }
}

/// States reachable from `state` in one transition.
#[must_use]
pub const fn successors(state: PredatorState) -> &'static [PredatorState] {
    use PredatorState::{Attack, Chase, Idle, Patrol, Rest};
    match state {
        Idle => &[Patrol, Chase, Attack, Rest],
        Patrol => &[Chase, Rest],
        Chase => &[Patrol, Rest, Attack],
        Attack => &[Rest, Idle],
        Rest => &[Idle],
    }
}

#[must_use]
pub fn can_transition(from: PredatorState, to: PredatorState) -> bool {
    successors(from).contains(&to)
}

/// Leaves the current state and enters `to`, running exit and enter
/// handlers. Enter handlers may transition again; those nested transitions
/// complete before this call returns.
pub fn transition(
    predator: &mut Predator,
    to: PredatorState,
    ctx: &mut HuntContext<'_>,
) -> Result<()> {
    let from = predator.state;
    if !can_transition(from, to) {
        tracing::error!(predator = %predator.id, %from, %to, "illegal transition");
        return Err(CoreError::IllegalTransition { from, to });
    }

    if let Some(on_exit) = handlers(from).on_exit {
        on_exit(predator, ctx)?;
    }

    predator.state = to;
    tracing::debug!(predator = %predator.id, %from, %to, energy = predator.energy, "transition");
    if let Some(metrics) = ctx.metrics {
        metrics.record_transition();
    }
    ctx.observer.on_state_enter(predator.id, to);

    if let Some(on_enter) = handlers(to).on_enter {
        on_enter(predator, ctx)?;
    }
    Ok(())
}

/// Runs one update of the predator's current state.
pub fn tick(predator: &mut Predator, ctx: &mut HuntContext<'_>) -> Result<()> {
    ensure_precondition!(
        ctx.dt.is_finite() && ctx.dt >= 0.0,
        "dt must be finite and non-negative, got {}",
        ctx.dt
    );
    if let Some(on_tick) = handlers(predator.state).on_tick {
        on_tick(predator, ctx)?;
    }
    debug_assert!(
        predator.current_target.map_or(true, |t| {
            ctx.registry.is_alive(t) && predator.target_set.contains(&t)
        }),
        "current target must be a live member of the target set"
    );
    Ok(())
}
