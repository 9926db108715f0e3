//! Session controller: the single entry point for timer and step commands

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{
    clock::Clock,
    events::{TimerEvent, TimerEventKind},
    registry::TimerRegistry,
    timer_state::ActiveTimer,
};
use crate::{
    error::{Result, TimerError},
    plan::OrchestrationPlan,
    recipe::{ScaledRecipe, StepId},
};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Mutable state of one cooking session.
///
/// Plain data with explicit `now` arguments; `SessionController` owns it
/// behind a mutex and supplies the clock.
#[derive(Debug, Clone)]
pub struct CookingSession {
    recipe: ScaledRecipe,
    plan: OrchestrationPlan,
    registry: TimerRegistry,
    current_step: usize,
    started_at: DateTime<Utc>,
}

/// Read-only view of a session for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub recipe_id: u64,
    pub recipe_name: String,
    pub servings: u32,
    pub current_step_index: usize,
    pub step_count: usize,
    pub elapsed_seconds: u64,
    pub timers: Vec<ActiveTimer>,
    /// Planned timers that may be started right now
    pub startable_steps: Vec<StepId>,
}

impl CookingSession {
    pub fn new(recipe: ScaledRecipe, plan: OrchestrationPlan, now: DateTime<Utc>) -> Self {
        Self {
            recipe,
            plan,
            registry: TimerRegistry::new(),
            current_step: 0,
            started_at: now,
        }
    }

    pub fn recipe(&self) -> &ScaledRecipe {
        &self.recipe
    }

    pub fn plan(&self) -> &OrchestrationPlan {
        &self.plan
    }

    pub fn registry(&self) -> &TimerRegistry {
        &self.registry
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step_count(&self) -> usize {
        self.recipe.scaled_steps.len()
    }

    pub fn start_timer(
        &mut self,
        step_id: StepId,
        duration_seconds: u64,
        label: &str,
        now: DateTime<Utc>,
    ) -> Result<(ActiveTimer, TimerEvent)> {
        let timer = self.registry.start(step_id, duration_seconds, label, now)?;
        let event = TimerEvent::new(TimerEventKind::Start, step_id, label, now);
        Ok((timer, event))
    }

    /// Start the timer the plan holds for `step_id`.
    ///
    /// A chained step is refused while the previous timer of its group is
    /// still running or paused.
    pub fn start_planned_timer(
        &mut self,
        step_id: StepId,
        now: DateTime<Utc>,
    ) -> Result<(ActiveTimer, TimerEvent)> {
        let entry = self.plan.entry(step_id).cloned().ok_or_else(|| {
            TimerError::InvalidInput(format!("step {} has no planned timer", step_id))
        })?;

        if let Some(predecessor) = self.plan.blocking_predecessor(step_id) {
            if self.registry.is_live(predecessor.step_id) {
                return Err(TimerError::StepNotReady {
                    step_id,
                    waiting_on: predecessor.step_id,
                });
            }
        }

        let label = self
            .recipe
            .step(step_id)
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| crate::recipe::DEFAULT_TIMER_LABEL.to_string());
        self.start_timer(step_id, entry.duration_seconds, &label, now)
    }

    /// Planned steps without a timer whose chain predecessor is not live
    pub fn startable_steps(&self) -> Vec<StepId> {
        self.plan
            .entries()
            .iter()
            .filter(|e| self.registry.get(e.step_id).is_none())
            .filter(|e| {
                self.plan
                    .blocking_predecessor(e.step_id)
                    .map_or(true, |p| !self.registry.is_live(p.step_id))
            })
            .map(|e| e.step_id)
            .collect()
    }

    pub fn pause_timer(&mut self, step_id: StepId, now: DateTime<Utc>) -> Option<TimerEvent> {
        self.registry.pause(step_id, now)
    }

    pub fn resume_timer(&mut self, step_id: StepId, now: DateTime<Utc>) -> Option<TimerEvent> {
        self.registry.resume(step_id, now)
    }

    pub fn remove_timer(&mut self, step_id: StepId, now: DateTime<Utc>) -> Option<TimerEvent> {
        self.registry.remove(step_id, now)
    }

    pub fn clear_timers(&mut self) -> usize {
        self.registry.clear()
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        self.registry.tick(now)
    }

    /// Move to the next step; stays put on the last one
    pub fn advance_step(&mut self) -> usize {
        if self.current_step + 1 < self.step_count() {
            self.current_step += 1;
        }
        self.current_step
    }

    /// Move to the previous step; stays put on the first one
    pub fn retreat_step(&mut self) -> usize {
        self.current_step = self.current_step.saturating_sub(1);
        self.current_step
    }

    /// Jump to `index`, clamped into the valid step range
    pub fn jump_to_step(&mut self, index: usize) -> usize {
        self.current_step = index.min(self.step_count().saturating_sub(1));
        self.current_step
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            recipe_id: self.recipe.recipe_id,
            recipe_name: self.recipe.recipe_name.clone(),
            servings: self.recipe.requested_servings,
            current_step_index: self.current_step,
            step_count: self.step_count(),
            elapsed_seconds: (now - self.started_at).num_seconds().max(0) as u64,
            timers: self.registry.timers().to_vec(),
            startable_steps: self.startable_steps(),
        }
    }
}

/// Shared handle over one cooking session.
///
/// Every command and every clock tick goes through the same mutex, so a
/// pause can never interleave with a tick of the same timer. Lifecycle
/// events are published on a broadcast channel.
#[derive(Debug)]
pub struct SessionController {
    session: Mutex<CookingSession>,
    clock: Arc<dyn Clock>,
    event_tx: broadcast::Sender<TimerEvent>,
}

impl SessionController {
    pub fn new(recipe: ScaledRecipe, plan: OrchestrationPlan, clock: Arc<dyn Clock>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let session = CookingSession::new(recipe, plan, clock.now());
        info!(
            "Cooking session opened for '{}' ({} servings)",
            session.recipe.recipe_name, session.recipe.requested_servings
        );

        Self {
            session: Mutex::new(session),
            clock,
            event_tx,
        }
    }

    /// Subscribe to timer lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    pub fn start_timer(&self, step_id: StepId, duration_seconds: u64, label: &str) -> Result<ActiveTimer> {
        let (timer, event) = {
            let mut session = self.lock()?;
            let now = self.clock.now();
            session.start_timer(step_id, duration_seconds, label, now)?
        };
        self.publish(event);
        Ok(timer)
    }

    pub fn start_planned_timer(&self, step_id: StepId) -> Result<ActiveTimer> {
        let (timer, event) = {
            let mut session = self.lock()?;
            let now = self.clock.now();
            session.start_planned_timer(step_id, now)?
        };
        self.publish(event);
        Ok(timer)
    }

    pub fn pause_timer(&self, step_id: StepId) -> Result<()> {
        let event = {
            let mut session = self.lock()?;
            let now = self.clock.now();
            session.pause_timer(step_id, now)
        };
        self.publish_optional(event, step_id, "pause");
        Ok(())
    }

    pub fn resume_timer(&self, step_id: StepId) -> Result<()> {
        let event = {
            let mut session = self.lock()?;
            let now = self.clock.now();
            session.resume_timer(step_id, now)
        };
        self.publish_optional(event, step_id, "resume");
        Ok(())
    }

    pub fn remove_timer(&self, step_id: StepId) -> Result<()> {
        let event = {
            let mut session = self.lock()?;
            let now = self.clock.now();
            session.remove_timer(step_id, now)
        };
        self.publish_optional(event, step_id, "remove");
        Ok(())
    }

    pub fn clear_timers(&self) -> Result<usize> {
        Ok(self.lock()?.clear_timers())
    }

    /// Recompute all running timers; returns the completions of this tick
    pub fn tick(&self) -> Result<Vec<TimerEvent>> {
        let completed = {
            let mut session = self.lock()?;
            let now = self.clock.now();
            session.tick(now)
        };
        for event in &completed {
            self.publish(event.clone());
        }
        Ok(completed)
    }

    pub fn advance_step(&self) -> Result<usize> {
        let index = self.lock()?.advance_step();
        debug!("Current step is now {}", index);
        Ok(index)
    }

    pub fn retreat_step(&self) -> Result<usize> {
        let index = self.lock()?.retreat_step();
        debug!("Current step is now {}", index);
        Ok(index)
    }

    pub fn jump_to_step(&self, index: usize) -> Result<usize> {
        let current = self.lock()?.jump_to_step(index);
        debug!("Jumped to step {} (requested {})", current, index);
        Ok(current)
    }

    pub fn current_step(&self) -> Result<usize> {
        Ok(self.lock()?.current_step())
    }

    pub fn timers(&self) -> Result<Vec<ActiveTimer>> {
        Ok(self.lock()?.registry().timers().to_vec())
    }

    pub fn plan(&self) -> Result<OrchestrationPlan> {
        Ok(self.lock()?.plan().clone())
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        let session = self.lock()?;
        Ok(session.snapshot(self.clock.now()))
    }

    /// Destroy every timer of the session
    pub fn end(&self) -> Result<()> {
        let mut session = self.lock()?;
        let cleared = session.clear_timers();
        info!(
            "Cooking session for '{}' ended ({} timers discarded)",
            session.recipe.recipe_name, cleared
        );
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, CookingSession>> {
        self.session
            .lock()
            .map_err(|e| TimerError::StateUnavailable(format!("Failed to lock session: {}", e)))
    }

    fn publish(&self, event: TimerEvent) {
        // No subscribers is normal when nothing is rendering
        if self.event_tx.send(event).is_err() {
            debug!("No subscribers for timer event");
        }
    }

    fn publish_optional(&self, event: Option<TimerEvent>, step_id: StepId, action: &str) {
        match event {
            Some(event) => self.publish(event),
            None => warn!("Ignored {} for step {}: no matching timer", action, step_id),
        }
    }
}
