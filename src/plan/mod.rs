//! Timer sequence planning
//!
//! The plan is advisory: it tells the session which timers may start now and
//! which are chained behind another timer of their parallel group.

pub mod external;
pub mod planner;

// Re-export main types
pub use external::{TimerOrchestration, TimerSequence};
pub use planner::{plan, OrchestrationPlan, OrchestrationStrategy, TimerPlanEntry};
