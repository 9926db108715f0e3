//! Orchestration plan derivation from scaled steps

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Result, TimerError},
    recipe::{GroupId, ScaledStep, StepId},
};

/// Planned start for one timer-bearing step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerPlanEntry {
    pub step_id: StepId,
    pub order_index: u32,
    pub duration_seconds: u64,
    /// Seconds after the cooking session starts
    pub start_offset_seconds: u64,
    pub parallel_group: Option<GroupId>,
    pub can_start_early: bool,
}

impl TimerPlanEntry {
    pub fn end_offset_seconds(&self) -> u64 {
        self.start_offset_seconds + self.duration_seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestrationStrategy {
    /// No timer-bearing steps at all
    None,
    Sequential,
    Parallel,
}

/// Ordered plan for every timer-bearing step of a scaled recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationPlan {
    entries: Vec<TimerPlanEntry>,
    total_cooking_time: u64,
    strategy: OrchestrationStrategy,
}

impl OrchestrationPlan {
    /// Build a plan from entries, checking the group invariants.
    ///
    /// Entries are sorted by order index; offsets are given as signed values
    /// so that a negative offset is reported instead of wrapped or clamped.
    pub(crate) fn from_offsets(mut raw: Vec<RawEntry>) -> Result<Self> {
        raw.sort_by_key(|r| r.order_index);

        let mut entries = Vec::with_capacity(raw.len());
        for r in &raw {
            if r.start_offset < 0 {
                return Err(TimerError::InvalidOrchestrationPlan(format!(
                    "step {} would start at negative offset {}s",
                    r.step_id, r.start_offset
                )));
            }
            if r.duration < 0 {
                return Err(TimerError::InvalidOrchestrationPlan(format!(
                    "step {} has negative duration {}s",
                    r.step_id, r.duration
                )));
            }
            entries.push(TimerPlanEntry {
                step_id: r.step_id,
                order_index: r.order_index,
                duration_seconds: r.duration as u64,
                start_offset_seconds: r.start_offset as u64,
                parallel_group: r.parallel_group,
                can_start_early: r.can_start_early,
            });
        }

        check_group_minimums(&entries)?;

        let total_cooking_time = entries
            .iter()
            .map(TimerPlanEntry::end_offset_seconds)
            .max()
            .unwrap_or(0);
        let strategy = if entries.is_empty() {
            OrchestrationStrategy::None
        } else if entries.iter().any(|e| e.parallel_group.is_some()) {
            OrchestrationStrategy::Parallel
        } else {
            OrchestrationStrategy::Sequential
        };

        Ok(Self {
            entries,
            total_cooking_time,
            strategy,
        })
    }

    pub fn entries(&self) -> &[TimerPlanEntry] {
        &self.entries
    }

    pub fn total_cooking_time(&self) -> u64 {
        self.total_cooking_time
    }

    pub fn strategy(&self) -> OrchestrationStrategy {
        self.strategy
    }

    pub fn entry(&self, step_id: StepId) -> Option<&TimerPlanEntry> {
        self.entries.iter().find(|e| e.step_id == step_id)
    }

    /// The group entry a chained step has to wait for.
    ///
    /// Returns `None` for sequential steps, the first entry of a group and
    /// entries flagged can-start-early.
    pub fn blocking_predecessor(&self, step_id: StepId) -> Option<&TimerPlanEntry> {
        let position = self.entries.iter().position(|e| e.step_id == step_id)?;
        let entry = &self.entries[position];
        let group = entry.parallel_group?;
        if entry.can_start_early {
            return None;
        }
        self.entries[..position]
            .iter()
            .rev()
            .find(|e| e.parallel_group == Some(group))
    }
}

/// Intermediate entry with signed arithmetic
#[derive(Debug, Clone)]
pub(crate) struct RawEntry {
    pub step_id: StepId,
    pub order_index: u32,
    pub duration: i64,
    pub start_offset: i64,
    pub parallel_group: Option<GroupId>,
    pub can_start_early: bool,
}

/// Running state of one parallel group while planning
struct GroupCursor {
    trigger: i64,
    last_offset: i64,
    last_duration: i64,
}

/// Derive start offsets for every timer-bearing step.
///
/// Sequential steps start when the previous timer-bearing step ends. The
/// first entry of a parallel group starts when the sequential step before
/// the group ends. Later entries flagged can-start-early share that trigger
/// point; the rest chain after the previous entry of their group.
pub fn plan(steps: &[ScaledStep]) -> Result<OrchestrationPlan> {
    let mut timed: Vec<&ScaledStep> = steps.iter().filter(|s| s.is_timer_bearing()).collect();
    timed.sort_by_key(|s| s.order_index);

    let mut raw = Vec::with_capacity(timed.len());
    let mut groups: HashMap<GroupId, GroupCursor> = HashMap::new();
    let mut previous_end: i64 = 0;
    let mut sequential_end: i64 = 0;

    for step in timed {
        let Some(seconds) = step.scaled_timer_seconds else {
            continue;
        };
        let duration = i64::from(seconds);

        let start_offset = match step.group() {
            None => {
                sequential_end = previous_end + duration;
                previous_end
            }
            Some(group) => match groups.get_mut(&group) {
                None => {
                    groups.insert(
                        group,
                        GroupCursor {
                            trigger: sequential_end,
                            last_offset: sequential_end,
                            last_duration: duration,
                        },
                    );
                    sequential_end
                }
                Some(cursor) => {
                    let offset = if step.can_start_early {
                        cursor.trigger
                    } else {
                        cursor.last_offset + cursor.last_duration
                    };
                    cursor.last_offset = offset;
                    cursor.last_duration = duration;
                    offset
                }
            },
        };

        debug!(
            "Planned step {} at +{}s for {}s (group: {:?})",
            step.step_id,
            start_offset,
            duration,
            step.group()
        );
        previous_end = start_offset + duration;

        raw.push(RawEntry {
            step_id: step.step_id,
            order_index: step.order_index,
            duration,
            start_offset,
            parallel_group: step.group(),
            can_start_early: step.can_start_early,
        });
    }

    let plan = OrchestrationPlan::from_offsets(raw)?;
    info!(
        "Orchestrated {} timer steps ({:?}, total {}s)",
        plan.entries.len(),
        plan.strategy,
        plan.total_cooking_time
    );
    Ok(plan)
}

/// Chained entries may never start before their group does.
///
/// A group starts at the offset of its first entry by order index; only
/// can-start-early entries are allowed ahead of it.
fn check_group_minimums(entries: &[TimerPlanEntry]) -> Result<()> {
    let mut group_starts: HashMap<GroupId, u64> = HashMap::new();
    for entry in entries {
        let Some(group) = entry.parallel_group else {
            continue;
        };
        let group_start = *group_starts
            .entry(group)
            .or_insert(entry.start_offset_seconds);
        if !entry.can_start_early && entry.start_offset_seconds < group_start {
            return Err(TimerError::InvalidOrchestrationPlan(format!(
                "step {} in group {} starts at {}s, before the group starts at {}s",
                entry.step_id, group, entry.start_offset_seconds, group_start
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: StepId, order: u32, seconds: Option<u32>) -> ScaledStep {
        ScaledStep {
            step_id: id,
            order_index: order,
            instruction: format!("step {}", id),
            has_timer: seconds.is_some(),
            original_timer_seconds: seconds,
            scaled_timer_seconds: seconds,
            timer_label: None,
            is_parallel: false,
            parallel_group: None,
            can_start_early: false,
            tips: None,
        }
    }

    fn grouped(id: StepId, order: u32, seconds: u32, group: GroupId, early: bool) -> ScaledStep {
        ScaledStep {
            is_parallel: true,
            parallel_group: Some(group),
            can_start_early: early,
            ..step(id, order, Some(seconds))
        }
    }

    fn offsets(plan: &OrchestrationPlan) -> Vec<u64> {
        plan.entries().iter().map(|e| e.start_offset_seconds).collect()
    }

    #[test]
    fn test_sequential_offsets() {
        let steps = vec![step(1, 1, Some(5)), step(2, 2, Some(10)), step(3, 3, Some(15))];
        let plan = plan(&steps).unwrap();

        assert_eq!(offsets(&plan), vec![0, 5, 15]);
        assert_eq!(plan.total_cooking_time(), 30);
        assert_eq!(plan.strategy(), OrchestrationStrategy::Sequential);
    }

    #[test]
    fn test_parallel_group_chaining() {
        let steps = vec![
            step(1, 1, Some(5)),
            grouped(2, 2, 5, 1, true),
            grouped(3, 3, 8, 1, false),
        ];
        let plan = plan(&steps).unwrap();

        assert_eq!(offsets(&plan), vec![0, 5, 10]);
        assert_eq!(plan.total_cooking_time(), 18);
        assert_eq!(plan.strategy(), OrchestrationStrategy::Parallel);
    }

    #[test]
    fn test_early_entries_share_trigger() {
        let steps = vec![
            step(1, 1, Some(60)),
            grouped(2, 2, 300, 4, false),
            grouped(3, 3, 120, 4, true),
            grouped(4, 4, 30, 4, true),
        ];
        let plan = plan(&steps).unwrap();

        assert_eq!(offsets(&plan), vec![0, 60, 60, 60]);
        assert_eq!(plan.total_cooking_time(), 360);
    }

    #[test]
    fn test_group_opening_recipe_starts_at_zero() {
        let steps = vec![grouped(1, 1, 20, 2, false), grouped(2, 2, 10, 2, true), step(3, 3, Some(5))];
        let plan = plan(&steps).unwrap();

        // The sequential step follows the previous entry, not the longest one
        assert_eq!(offsets(&plan), vec![0, 0, 10]);
    }

    #[test]
    fn test_filters_untimed_and_sorts_by_order() {
        let steps = vec![
            step(3, 3, Some(15)),
            step(9, 2, None),
            step(1, 1, Some(5)),
        ];
        let plan = plan(&steps).unwrap();

        let ids: Vec<StepId> = plan.entries().iter().map(|e| e.step_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(offsets(&plan), vec![0, 5]);
    }

    #[test]
    fn test_parallel_flag_without_group_is_sequential() {
        let mut loose = step(2, 2, Some(10));
        loose.is_parallel = true;
        let steps = vec![step(1, 1, Some(5)), loose];
        let plan = plan(&steps).unwrap();

        assert_eq!(plan.entries()[1].parallel_group, None);
        assert_eq!(plan.strategy(), OrchestrationStrategy::Sequential);
    }

    #[test]
    fn test_empty_plan() {
        let plan = plan(&[step(1, 1, None)]).unwrap();
        assert!(plan.entries().is_empty());
        assert_eq!(plan.total_cooking_time(), 0);
        assert_eq!(plan.strategy(), OrchestrationStrategy::None);
    }

    #[test]
    fn test_blocking_predecessor() {
        let steps = vec![
            step(1, 1, Some(5)),
            grouped(2, 2, 5, 1, true),
            grouped(3, 3, 8, 1, false),
            grouped(4, 4, 8, 1, true),
        ];
        let plan = plan(&steps).unwrap();

        assert!(plan.blocking_predecessor(1).is_none());
        assert!(plan.blocking_predecessor(2).is_none());
        assert_eq!(plan.blocking_predecessor(3).map(|e| e.step_id), Some(2));
        assert!(plan.blocking_predecessor(4).is_none());
        assert!(plan.blocking_predecessor(42).is_none());
    }

    #[test]
    fn test_negative_offsets_are_rejected() {
        let raw = vec![RawEntry {
            step_id: 1,
            order_index: 1,
            duration: 10,
            start_offset: -5,
            parallel_group: None,
            can_start_early: false,
        }];
        assert!(matches!(
            OrchestrationPlan::from_offsets(raw),
            Err(TimerError::InvalidOrchestrationPlan(_))
        ));
    }

    #[test]
    fn test_chained_entry_before_group_start_is_rejected() {
        let mut raw = vec![
            RawEntry {
                step_id: 1,
                order_index: 1,
                duration: 10,
                start_offset: 20,
                parallel_group: Some(1),
                can_start_early: false,
            },
            RawEntry {
                step_id: 2,
                order_index: 2,
                duration: 10,
                start_offset: 10,
                parallel_group: Some(1),
                can_start_early: false,
            },
        ];
        assert!(matches!(
            OrchestrationPlan::from_offsets(raw.clone()),
            Err(TimerError::InvalidOrchestrationPlan(_))
        ));

        raw[1].can_start_early = true;
        assert!(OrchestrationPlan::from_offsets(raw).is_ok());
    }
}
