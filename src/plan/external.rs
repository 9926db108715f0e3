//! Acceptance of a precomputed orchestration supplied by the recipe service

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::planner::{OrchestrationPlan, RawEntry};
use crate::{
    error::{Result, TimerError},
    recipe::{scaling::scale_seconds, GroupId, ScaledRecipe, StepId},
};

/// Wire shape of the backend's timer orchestration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerOrchestration {
    #[serde(default)]
    pub recipe_id: Option<u64>,
    #[serde(default)]
    pub recipe_name: Option<String>,
    pub timer_sequence: Vec<TimerSequence>,
    #[serde(default)]
    pub total_cooking_time: Option<i64>,
    #[serde(default)]
    pub orchestration_strategy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSequence {
    pub step_id: StepId,
    pub order_index: u32,
    #[serde(default)]
    pub timer_label: Option<String>,
    pub duration_seconds: i64,
    pub start_at_second: i64,
    #[serde(default)]
    pub can_start_early: bool,
    #[serde(default)]
    pub parallel_group: Option<GroupId>,
    #[serde(default)]
    pub instruction: Option<String>,
}

impl OrchestrationPlan {
    /// Accept a backend-supplied orchestration instead of planning locally.
    ///
    /// The backend plans from the recipe's base durations, so every offset and
    /// duration is rescaled by the session's scaling factor first. Each entry
    /// must then name a distinct timer-bearing step whose scaled duration it
    /// matches, and satisfy the same offset invariants as a local plan.
    pub fn from_external(orchestration: &TimerOrchestration, recipe: &ScaledRecipe) -> Result<Self> {
        let factor = recipe.scaling_factor;
        let mut seen = HashSet::new();
        let mut raw = Vec::with_capacity(orchestration.timer_sequence.len());

        for entry in &orchestration.timer_sequence {
            if !seen.insert(entry.step_id) {
                return Err(TimerError::InvalidOrchestrationPlan(format!(
                    "step {} is planned more than once",
                    entry.step_id
                )));
            }
            let Some(step) = recipe
                .step(entry.step_id)
                .filter(|s| s.is_timer_bearing())
            else {
                return Err(TimerError::InvalidOrchestrationPlan(format!(
                    "step {} is not a timer step of this recipe",
                    entry.step_id
                )));
            };

            let duration = rescale(entry.step_id, entry.duration_seconds, factor)?;
            let start_offset = rescale(entry.step_id, entry.start_at_second, factor)?;
            if step.scaled_timer_seconds.map(i64::from) != Some(duration) {
                return Err(TimerError::InvalidOrchestrationPlan(format!(
                    "step {} is planned for {}s but runs {:?}s at {} servings",
                    entry.step_id, duration, step.scaled_timer_seconds, recipe.requested_servings
                )));
            }

            raw.push(RawEntry {
                step_id: entry.step_id,
                order_index: entry.order_index,
                duration,
                start_offset,
                parallel_group: entry.parallel_group,
                can_start_early: entry.can_start_early,
            });
        }

        let plan = Self::from_offsets(raw)?;

        if let Some(total) = orchestration.total_cooking_time {
            if scale_seconds(total, factor) != plan.total_cooking_time() as f64 {
                warn!(
                    "Supplied total cooking time {}s differs from plan total {}s",
                    total,
                    plan.total_cooking_time()
                );
            }
        }
        debug!(
            "Accepted external orchestration ({:?} supplied, {:?} derived, factor {})",
            orchestration.orchestration_strategy,
            plan.strategy(),
            factor
        );

        Ok(plan)
    }
}

fn rescale(step_id: StepId, seconds: i64, factor: f64) -> Result<i64> {
    let scaled = scale_seconds(seconds, factor);
    if scaled.abs() > f64::from(u32::MAX) {
        return Err(TimerError::InvalidOrchestrationPlan(format!(
            "step {} has an out of range time of {}s",
            step_id, seconds
        )));
    }
    Ok(scaled as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        plan::OrchestrationStrategy,
        recipe::{scale, Recipe, Step},
    };

    fn timed(id: StepId, seconds: u32) -> Step {
        Step {
            step_id: id,
            order_index: id as u32,
            instruction: String::new(),
            has_timer: true,
            timer_seconds: Some(seconds),
            timer_label: None,
            is_parallel: false,
            parallel_group: None,
            can_start_early: false,
            tips: None,
        }
    }

    /// Recipe for two servings, scaled to `servings`
    fn scaled(steps: Vec<Step>, servings: u32) -> ScaledRecipe {
        let recipe = Recipe {
            recipe_id: 1,
            name: "Curry".to_string(),
            default_servings: 2,
            ingredients: Vec::new(),
            steps,
        };
        scale(&recipe, servings).unwrap()
    }

    fn sequence(id: StepId, order: u32, duration: i64, start: i64) -> TimerSequence {
        TimerSequence {
            step_id: id,
            order_index: order,
            timer_label: None,
            duration_seconds: duration,
            start_at_second: start,
            can_start_early: false,
            parallel_group: None,
            instruction: None,
        }
    }

    fn orchestration(timer_sequence: Vec<TimerSequence>) -> TimerOrchestration {
        TimerOrchestration {
            recipe_id: None,
            recipe_name: None,
            timer_sequence,
            total_cooking_time: None,
            orchestration_strategy: None,
        }
    }

    #[test]
    fn test_accepts_backend_payload() {
        let json = r#"{
            "recipeId": 1,
            "recipeName": "Curry",
            "timerSequence": [
                {"stepId": 2, "orderIndex": 2, "durationSeconds": 300, "startAtSecond": 60,
                 "canStartEarly": true, "parallelGroup": 1, "timerLabel": "Rice"},
                {"stepId": 1, "orderIndex": 1, "durationSeconds": 60, "startAtSecond": 0}
            ],
            "totalCookingTime": 360,
            "orchestrationStrategy": "PARALLEL"
        }"#;
        let orchestration: TimerOrchestration = serde_json::from_str(json).unwrap();
        let recipe = scaled(vec![timed(1, 60), timed(2, 300)], 2);
        let plan = OrchestrationPlan::from_external(&orchestration, &recipe).unwrap();

        let ids: Vec<StepId> = plan.entries().iter().map(|e| e.step_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(plan.total_cooking_time(), 360);
        assert_eq!(plan.strategy(), OrchestrationStrategy::Parallel);
    }

    #[test]
    fn test_rescales_to_requested_servings() {
        let plan_for_base = orchestration(vec![sequence(1, 1, 60, 0), sequence(2, 2, 45, 60)]);
        let steps = vec![timed(1, 60), timed(2, 45)];

        let doubled = OrchestrationPlan::from_external(&plan_for_base, &scaled(steps.clone(), 4))
            .unwrap();
        assert_eq!(doubled.entry(1).unwrap().duration_seconds, 120);
        assert_eq!(doubled.entry(2).unwrap().start_offset_seconds, 120);
        assert_eq!(doubled.entry(2).unwrap().duration_seconds, 90);
        assert_eq!(doubled.total_cooking_time(), 210);

        // 45 * 3/2 = 67.5 rounds up, same as the scaled step
        let recipe = scaled(steps, 3);
        let plan = OrchestrationPlan::from_external(&plan_for_base, &recipe).unwrap();
        assert_eq!(
            plan.entry(2).unwrap().duration_seconds,
            u64::from(recipe.step(2).unwrap().scaled_timer_seconds.unwrap())
        );
        assert_eq!(plan.entry(2).unwrap().start_offset_seconds, 90);
    }

    #[test]
    fn test_rejects_duration_disagreeing_with_recipe() {
        let plan_for_base = orchestration(vec![sequence(1, 1, 90, 0)]);
        let err = OrchestrationPlan::from_external(&plan_for_base, &scaled(vec![timed(1, 60)], 2))
            .unwrap_err();
        assert!(matches!(err, TimerError::InvalidOrchestrationPlan(_)));
    }

    #[test]
    fn test_rejects_negative_offset() {
        let plan_for_base = orchestration(vec![sequence(1, 1, 60, -10)]);
        let err = OrchestrationPlan::from_external(&plan_for_base, &scaled(vec![timed(1, 60)], 2))
            .unwrap_err();
        assert!(matches!(err, TimerError::InvalidOrchestrationPlan(_)));
    }

    #[test]
    fn test_rejects_unknown_and_duplicate_steps() {
        let recipe = scaled(vec![timed(1, 60)], 2);
        let mut plan_for_base = orchestration(vec![sequence(5, 1, 60, 0)]);
        assert!(OrchestrationPlan::from_external(&plan_for_base, &recipe).is_err());

        plan_for_base.timer_sequence = vec![sequence(1, 1, 60, 0), sequence(1, 1, 60, 60)];
        assert!(OrchestrationPlan::from_external(&plan_for_base, &recipe).is_err());
    }
}
