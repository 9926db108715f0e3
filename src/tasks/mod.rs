//! Background tasks module
//!
//! This module contains the periodic driver that runs alongside a cooking session.

pub mod orchestration_clock;

// Re-export main types
pub use orchestration_clock::{orchestration_clock_task, ClockDriver};
