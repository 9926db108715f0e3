//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{clock::Clock, session::{SessionController, SessionSnapshot}};
use crate::{
    error::{Result, TimerError},
    plan::{plan, OrchestrationPlan, TimerOrchestration},
    recipe::{scale, Recipe},
    tasks::ClockDriver,
};

/// A running cooking session together with its clock driver
#[derive(Debug)]
struct ActiveSession {
    controller: Arc<SessionController>,
    driver: ClockDriver,
}

impl ActiveSession {
    async fn end(self) {
        self.driver.stop().await;
        if let Err(e) = self.controller.end() {
            warn!("Failed to clear session timers: {}", e);
        }
    }
}

/// Process-wide state for the HTTP façade: one recipe, at most one session
#[derive(Debug)]
pub struct AppState {
    /// Base recipe every session is scaled from
    pub recipe: Recipe,
    /// Backend-supplied plan used instead of local planning
    pub external_plan: Option<TimerOrchestration>,
    pub clock: Arc<dyn Clock>,
    pub tick_interval: Duration,
    session: Mutex<Option<ActiveSession>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(
        recipe: Recipe,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
        host: String,
        port: u16,
    ) -> Self {
        Self {
            recipe,
            external_plan: None,
            clock,
            tick_interval,
            session: Mutex::new(None),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    pub fn with_external_plan(mut self, orchestration: TimerOrchestration) -> Self {
        self.external_plan = Some(orchestration);
        self
    }

    /// Scale the recipe, plan its timers and open a fresh session.
    ///
    /// Any previous session is ended first: its driver is stopped and its
    /// timers are discarded.
    pub async fn begin_session(&self, servings: u32) -> Result<SessionSnapshot> {
        let scaled = scale(&self.recipe, servings)?;
        let orchestration = match &self.external_plan {
            Some(external) => OrchestrationPlan::from_external(external, &scaled)?,
            None => plan(&scaled.scaled_steps)?,
        };

        let controller = Arc::new(SessionController::new(
            scaled,
            orchestration,
            Arc::clone(&self.clock),
        ));
        let snapshot = controller.snapshot()?;

        // The driver is only spawned once the slot is held, so a failed lock
        // leaves nothing running
        let previous = {
            let mut slot = self.lock_session()?;
            let driver = ClockDriver::spawn(Arc::clone(&controller), self.tick_interval);
            slot.replace(ActiveSession { controller, driver })
        };
        if let Some(previous) = previous {
            info!("Replacing previous cooking session");
            previous.end().await;
        }

        self.record_action("session-start");
        Ok(snapshot)
    }

    /// End the current session; returns false when none was open
    pub async fn end_session(&self) -> Result<bool> {
        let current = self.lock_session()?.take();
        match current {
            Some(session) => {
                session.end().await;
                self.record_action("session-end");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Controller of the open session
    pub fn controller(&self) -> Result<Arc<SessionController>> {
        self.lock_session()?
            .as_ref()
            .map(|s| Arc::clone(&s.controller))
            .ok_or(TimerError::NoSession)
    }

    pub fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn lock_session(&self) -> Result<std::sync::MutexGuard<'_, Option<ActiveSession>>> {
        self.session
            .lock()
            .map_err(|e| TimerError::StateUnavailable(format!("Failed to lock session slot: {}", e)))
    }
}
