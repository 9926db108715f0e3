//! Cooking Timers - drift-free timer orchestration for guided cooking
//!
//! This library scales recipes by serving count, plans when each step's timer
//! may start relative to its parallel group, and runs a set of pausable
//! countdowns whose remaining time is always derived from the wall clock.

pub mod config;
pub mod error;
pub mod recipe;
pub mod plan;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, TimerError};
pub use state::{AppState, SessionController};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
