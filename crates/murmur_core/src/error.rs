//! Error types for murmur_core.
//!
//! Recoverable hunting conditions (no waypoint, no prey, a target killed by
//! someone else) never show up here; the state machine resolves them with a
//! fallback transition. What remains are precondition violations and
//! programming errors, which must fail loudly.

use murmur_data::{AgentId, PredatorId, PredatorState};
use thiserror::Error;

/// Main error type for murmur_core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Degenerate input handed to a constructor or step function
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// A handler asked for a transition the state table does not allow
    #[error("Illegal transition {from} -> {to}")]
    IllegalTransition {
        from: PredatorState,
        to: PredatorState,
    },

    /// Handle that never existed or was already reaped
    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("Unknown predator: {0}")]
    UnknownPredator(PredatorId),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for murmur_core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    #[must_use]
    pub fn precondition<S: Into<String>>(msg: S) -> Self {
        Self::Precondition(msg.into())
    }

    #[must_use]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

/// Returns `CoreError::Precondition` with the formatted message when the
/// condition does not hold.
#[macro_export]
macro_rules! ensure_precondition {
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            let msg = format!($($arg)+);
            tracing::error!(%msg, "precondition violated");
            return Err($crate::error::CoreError::precondition(msg));
        }
    };
}
