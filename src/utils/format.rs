//! Countdown display formatting

/// Format seconds as "m:ss", the way the cooking view shows a countdown
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
