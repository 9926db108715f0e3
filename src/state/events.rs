//! Timer lifecycle events published to the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recipe::StepId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerEventKind {
    Start,
    Pause,
    Resume,
    Complete,
    Remove,
}

impl TimerEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Pause => "PAUSE",
            Self::Resume => "RESUME",
            Self::Complete => "COMPLETE",
            Self::Remove => "REMOVE",
        }
    }
}

/// One timer state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerEvent {
    #[serde(rename = "type")]
    pub kind: TimerEventKind,
    pub step_id: StepId,
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

impl TimerEvent {
    pub fn new(kind: TimerEventKind, step_id: StepId, label: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            step_id,
            label: label.to_string(),
            timestamp,
        }
    }

    /// Completion events are the ones that trigger a user notification
    pub fn is_completion(&self) -> bool {
        self.kind == TimerEventKind::Complete
    }
}
