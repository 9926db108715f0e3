//! Live timer store for one cooking session

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{
    events::{TimerEvent, TimerEventKind},
    timer_state::ActiveTimer,
};
use crate::{
    error::{Result, TimerError},
    recipe::StepId,
    utils::format_clock,
};

/// All timers of a session, at most one per step, in start order.
///
/// Creation is strict (one live timer per step); every other command on a
/// missing or finished timer is a silent no-op.
#[derive(Debug, Default, Clone)]
pub struct TimerRegistry {
    timers: Vec<ActiveTimer>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a countdown for `step_id`.
    ///
    /// Fails with `DuplicateTimer` while a RUNNING or PAUSED timer exists for
    /// the step. A COMPLETED timer for the step is replaced.
    pub fn start(
        &mut self,
        step_id: StepId,
        duration_seconds: u64,
        label: &str,
        now: DateTime<Utc>,
    ) -> Result<ActiveTimer> {
        if let Some(position) = self.position(step_id) {
            if self.timers[position].is_live() {
                return Err(TimerError::DuplicateTimer(step_id));
            }
            debug!("Replacing completed timer for step {}", step_id);
            self.timers.remove(position);
        }

        let timer = ActiveTimer::new(step_id, label, duration_seconds, now);
        info!(
            "Timer started for step {} ({}, {})",
            step_id,
            label,
            format_clock(duration_seconds)
        );
        self.timers.push(timer.clone());
        Ok(timer)
    }

    /// Recompute every running timer against one `now` snapshot.
    ///
    /// Returns a completion event for each timer that reached zero during
    /// this call; already completed timers are never reported again.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        let mut completed = Vec::new();
        for timer in &mut self.timers {
            if timer.refresh(now) {
                info!("Timer completed for step {} ({})", timer.step_id, timer.label);
                completed.push(TimerEvent::new(
                    TimerEventKind::Complete,
                    timer.step_id,
                    &timer.label,
                    now,
                ));
            }
        }
        completed
    }

    pub fn pause(&mut self, step_id: StepId, now: DateTime<Utc>) -> Option<TimerEvent> {
        let timer = self.get_mut(step_id)?;
        let kind = timer.pause(now)?;
        info!(
            "Timer {} for step {} with {} remaining",
            if kind == TimerEventKind::Pause { "paused" } else { "completed" },
            step_id,
            format_clock(timer.remaining_seconds)
        );
        Some(TimerEvent::new(kind, step_id, &timer.label, now))
    }

    pub fn resume(&mut self, step_id: StepId, now: DateTime<Utc>) -> Option<TimerEvent> {
        let timer = self.get_mut(step_id)?;
        if !timer.resume(now) {
            return None;
        }
        info!(
            "Timer resumed for step {} with {}s remaining",
            step_id, timer.remaining_seconds
        );
        Some(TimerEvent::new(TimerEventKind::Resume, step_id, &timer.label, now))
    }

    pub fn remove(&mut self, step_id: StepId, now: DateTime<Utc>) -> Option<TimerEvent> {
        let position = self.position(step_id)?;
        let timer = self.timers.remove(position);
        info!("Timer removed for step {}", step_id);
        Some(TimerEvent::new(TimerEventKind::Remove, step_id, &timer.label, now))
    }

    /// Drop every timer; returns how many were removed
    pub fn clear(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        if count > 0 {
            info!("Cleared {} timers", count);
        }
        count
    }

    pub fn get(&self, step_id: StepId) -> Option<&ActiveTimer> {
        self.timers.iter().find(|t| t.step_id == step_id)
    }

    pub fn is_live(&self, step_id: StepId) -> bool {
        self.get(step_id).is_some_and(ActiveTimer::is_live)
    }

    pub fn timers(&self) -> &[ActiveTimer] {
        &self.timers
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn position(&self, step_id: StepId) -> Option<usize> {
        self.timers.iter().position(|t| t.step_id == step_id)
    }

    fn get_mut(&mut self, step_id: StepId) -> Option<&mut ActiveTimer> {
        self.timers.iter_mut().find(|t| t.step_id == step_id)
    }
}
