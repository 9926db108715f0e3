//! State management module
//!
//! This module contains the timer state machine, the per-session registry and
//! controller, and the process-wide application state.

pub mod app_state;
pub mod clock;
pub mod events;
pub mod registry;
pub mod session;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{TimerEvent, TimerEventKind};
pub use registry::TimerRegistry;
pub use session::{CookingSession, SessionController, SessionSnapshot};
pub use timer_state::{ActiveTimer, TimerLifecycle};
