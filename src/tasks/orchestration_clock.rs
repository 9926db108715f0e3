//! Orchestration clock background task

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::state::SessionController;

/// Background task that ticks a session's timers until told to stop.
///
/// Each tick recomputes remaining time from the wall clock, so a delayed or
/// skipped tick only delays reporting; it never changes the result.
pub async fn orchestration_clock_task(
    controller: Arc<SessionController>,
    tick_interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    info!("Starting orchestration clock ({}ms tick)", tick_interval.as_millis());

    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failed_ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match controller.tick() {
                    Ok(completed) => {
                        if failed_ticks > 0 {
                            info!("Session timers ticking again after {} failed ticks", failed_ticks);
                            failed_ticks = 0;
                        }
                        for event in completed {
                            info!("Timer '{}' for step {} finished", event.label, event.step_id);
                        }
                    }
                    Err(e) => {
                        // Keep running; the session stays until it is ended
                        if failed_ticks == 0 {
                            error!("Failed to tick session timers: {}", e);
                        } else {
                            debug!("Tick {} failed again: {}", failed_ticks + 1, e);
                        }
                        failed_ticks += 1;
                    }
                }
            }

            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    debug!("Orchestration clock received stop signal");
                    break;
                }
            }
        }
    }

    info!("Orchestration clock stopped");
}

/// Handle to a running orchestration clock
#[derive(Debug)]
pub struct ClockDriver {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ClockDriver {
    /// Spawn the clock task for `controller` on the current runtime
    pub fn spawn(controller: Arc<SessionController>, tick_interval: Duration) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let tick_interval = tick_interval.max(Duration::from_millis(1));
        let handle = tokio::spawn(orchestration_clock_task(controller, tick_interval, stop_rx));
        Self { stop_tx, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the task and wait for it to exit
    pub async fn stop(self) {
        if self.stop_tx.send(true).is_err() {
            debug!("Orchestration clock already gone");
        }
        if let Err(e) = self.handle.await {
            warn!("Orchestration clock task ended abnormally: {}", e);
        }
    }
}
