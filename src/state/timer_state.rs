//! Countdown state for one step's timer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::events::TimerEventKind;
use crate::recipe::StepId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerLifecycle {
    Running,
    Paused,
    Completed,
}

/// A countdown for one step.
///
/// `remaining_seconds` is never decremented. While running it is recomputed
/// as `baseline_seconds - (now - start_instant)`, so late or skipped ticks
/// cannot make it drift from the wall clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimer {
    pub step_id: StepId,
    pub label: String,
    /// Duration requested at creation; fixed for the timer's lifetime
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
    pub state: TimerLifecycle,
    /// Set at creation and again on every resume
    pub start_instant: DateTime<Utc>,
    /// Only present while paused
    pub paused_remaining: Option<u64>,
    /// Countdown length measured from `start_instant`
    baseline_seconds: u64,
}

impl ActiveTimer {
    pub fn new(step_id: StepId, label: &str, duration_seconds: u64, now: DateTime<Utc>) -> Self {
        Self {
            step_id,
            label: label.to_string(),
            duration_seconds,
            remaining_seconds: duration_seconds,
            state: TimerLifecycle::Running,
            start_instant: now,
            paused_remaining: None,
            baseline_seconds: duration_seconds,
        }
    }

    /// RUNNING or PAUSED
    pub fn is_live(&self) -> bool {
        matches!(self.state, TimerLifecycle::Running | TimerLifecycle::Paused)
    }

    pub fn is_completed(&self) -> bool {
        self.state == TimerLifecycle::Completed
    }

    /// Remaining seconds at `now` without touching state
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u64 {
        match self.state {
            TimerLifecycle::Running => {
                let elapsed = (now - self.start_instant).num_seconds().max(0) as u64;
                self.baseline_seconds.saturating_sub(elapsed)
            }
            TimerLifecycle::Paused => self.paused_remaining.unwrap_or(self.remaining_seconds),
            TimerLifecycle::Completed => 0,
        }
    }

    /// Recompute remaining time; returns true on the transition to COMPLETED
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != TimerLifecycle::Running {
            return false;
        }
        self.remaining_seconds = self.remaining_at(now);
        if self.remaining_seconds == 0 {
            self.state = TimerLifecycle::Completed;
            return true;
        }
        false
    }

    /// Freeze the countdown.
    ///
    /// A timer that has already run out completes instead of pausing.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<TimerEventKind> {
        if self.state != TimerLifecycle::Running {
            return None;
        }
        if self.refresh(now) {
            return Some(TimerEventKind::Complete);
        }
        self.paused_remaining = Some(self.remaining_seconds);
        self.state = TimerLifecycle::Paused;
        Some(TimerEventKind::Pause)
    }

    /// Continue from exactly the frozen remaining time
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != TimerLifecycle::Paused {
            return false;
        }
        let frozen = self.paused_remaining.take().unwrap_or(self.remaining_seconds);
        self.baseline_seconds = frozen;
        self.remaining_seconds = frozen;
        self.start_instant = now;
        self.state = TimerLifecycle::Running;
        true
    }

    /// Fraction of the original duration still to go, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.duration_seconds == 0 {
            return 0.0;
        }
        self.remaining_seconds as f64 / self.duration_seconds as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap()
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(seconds)
    }

    #[test]
    fn test_new_timer_is_running() {
        let timer = ActiveTimer::new(1, "Boil pasta", 600, t0());
        assert_eq!(timer.state, TimerLifecycle::Running);
        assert_eq!(timer.remaining_seconds, 600);
        assert!(timer.is_live());
        assert_eq!(timer.progress(), 1.0);
    }

    #[test]
    fn test_refresh_uses_wall_clock() {
        let mut timer = ActiveTimer::new(1, "Boil", 10, t0());
        assert!(!timer.refresh(at(1)));
        assert_eq!(timer.remaining_seconds, 9);

        // Ticks between 1s and 9s never happened
        assert!(!timer.refresh(at(9)));
        assert_eq!(timer.remaining_seconds, 1);

        assert!(timer.refresh(at(10)));
        assert_eq!(timer.state, TimerLifecycle::Completed);
        assert!(!timer.refresh(at(11)));
    }

    #[test]
    fn test_sub_second_elapsed_is_truncated() {
        let mut timer = ActiveTimer::new(1, "Boil", 10, t0());
        timer.refresh(t0() + Duration::milliseconds(1999));
        assert_eq!(timer.remaining_seconds, 9);
    }

    #[test]
    fn test_clock_going_backwards_does_not_add_time() {
        let mut timer = ActiveTimer::new(1, "Boil", 10, t0());
        timer.refresh(at(-30));
        assert_eq!(timer.remaining_seconds, 10);
    }

    #[test]
    fn test_pause_resume_keeps_exact_remaining() {
        let mut timer = ActiveTimer::new(1, "Sear", 20, t0());
        timer.refresh(at(7));
        assert_eq!(timer.remaining_seconds, 13);

        assert_eq!(timer.pause(at(7)), Some(TimerEventKind::Pause));
        assert_eq!(timer.paused_remaining, Some(13));

        // Five seconds pass while paused
        assert!(!timer.refresh(at(12)));
        assert_eq!(timer.remaining_at(at(12)), 13);

        assert!(timer.resume(at(12)));
        assert_eq!(timer.remaining_seconds, 13);
        assert_eq!(timer.remaining_at(at(12)), 13);
        assert_eq!(timer.start_instant, at(12));
        assert_eq!(timer.paused_remaining, None);
        assert_eq!(timer.duration_seconds, 20);

        timer.refresh(at(20));
        assert_eq!(timer.remaining_seconds, 5);
        assert!(timer.refresh(at(25)));
    }

    #[test]
    fn test_pause_and_resume_are_noops_in_wrong_state() {
        let mut timer = ActiveTimer::new(1, "Sear", 20, t0());
        assert!(!timer.resume(at(1)));

        timer.pause(at(2));
        assert_eq!(timer.pause(at(3)), None);
        assert_eq!(timer.paused_remaining, Some(18));

        timer.resume(at(4));
        timer.refresh(at(30));
        assert!(timer.is_completed());
        assert_eq!(timer.pause(at(31)), None);
        assert!(!timer.resume(at(31)));
        assert_eq!(timer.state, TimerLifecycle::Completed);
    }

    #[test]
    fn test_pause_after_expiry_completes() {
        let mut timer = ActiveTimer::new(1, "Rest", 5, t0());
        assert_eq!(timer.pause(at(8)), Some(TimerEventKind::Complete));
        assert!(timer.is_completed());
        assert_eq!(timer.remaining_seconds, 0);
    }

    #[test]
    fn test_progress() {
        let mut timer = ActiveTimer::new(1, "Rest", 40, t0());
        timer.refresh(at(30));
        assert_eq!(timer.progress(), 0.25);

        let empty = ActiveTimer::new(2, "Nothing", 0, t0());
        assert_eq!(empty.progress(), 0.0);
    }
}
