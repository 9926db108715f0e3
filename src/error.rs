//! Error types shared by the scaling, planning and timer modules

use thiserror::Error;

use crate::recipe::StepId;

/// Errors returned by the timer orchestration engine.
///
/// Every variant is local and recoverable. Control commands on unknown or
/// finished timers are not errors at all; only creation is strict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// Non-positive servings or a malformed recipe
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Parallel-group offsets that cannot be satisfied
    #[error("invalid orchestration plan: {0}")]
    InvalidOrchestrationPlan(String),

    /// A RUNNING or PAUSED timer already exists for the step
    #[error("a live timer already exists for step {0}")]
    DuplicateTimer(StepId),

    /// A chained step whose group predecessor is still counting down
    #[error("step {step_id} cannot start until the timer for step {waiting_on} finishes")]
    StepNotReady { step_id: StepId, waiting_on: StepId },

    #[error("no cooking session is active")]
    NoSession,

    #[error("session state unavailable: {0}")]
    StateUnavailable(String),
}

pub type Result<T> = std::result::Result<T, TimerError>;
