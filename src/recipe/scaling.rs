//! Linear recipe scaling by serving count

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{GroupId, Ingredient, Recipe, Step, StepId};
use crate::error::{Result, TimerError};

/// Label shown for timers whose step carries none
pub const DEFAULT_TIMER_LABEL: &str = "Timer";

/// A recipe rescaled for a requested number of servings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledRecipe {
    pub recipe_id: u64,
    pub recipe_name: String,
    pub original_servings: u32,
    pub requested_servings: u32,
    pub scaling_factor: f64,
    pub scaled_ingredients: Vec<ScaledIngredient>,
    pub scaled_steps: Vec<ScaledStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledIngredient {
    pub ingredient_id: u64,
    pub ingredient_name: String,
    pub original_quantity: f64,
    pub scaled_quantity: f64,
    pub unit: String,
    pub preparation: Option<String>,
    pub is_optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledStep {
    pub step_id: StepId,
    pub order_index: u32,
    pub instruction: String,
    pub has_timer: bool,
    pub original_timer_seconds: Option<u32>,
    pub scaled_timer_seconds: Option<u32>,
    pub timer_label: Option<String>,
    pub is_parallel: bool,
    pub parallel_group: Option<GroupId>,
    pub can_start_early: bool,
    pub tips: Option<String>,
}

impl ScaledStep {
    /// True when the step carries a timer with a known duration
    pub fn is_timer_bearing(&self) -> bool {
        self.has_timer && self.scaled_timer_seconds.is_some()
    }

    /// Parallel group the step runs in, if it is actually parallel
    pub fn group(&self) -> Option<GroupId> {
        if self.is_parallel {
            self.parallel_group
        } else {
            None
        }
    }

    pub fn label(&self) -> &str {
        self.timer_label.as_deref().unwrap_or(DEFAULT_TIMER_LABEL)
    }
}

impl ScaledIngredient {
    /// Quantity as shown to a cook.
    ///
    /// Spoon and cup measures snap to the nearest quarter; everything else is
    /// shown with two decimals. `scaled_quantity` itself stays exact.
    pub fn display_quantity(&self) -> f64 {
        let unit = self.unit.to_lowercase();
        if unit.contains("cup") || unit.contains("tbsp") || unit.contains("tsp") {
            (self.scaled_quantity * 4.0).round() / 4.0
        } else {
            (self.scaled_quantity * 100.0).round() / 100.0
        }
    }
}

impl ScaledRecipe {
    /// Treat the scaled result as a new base recipe at the requested servings
    pub fn as_recipe(&self) -> Recipe {
        Recipe {
            recipe_id: self.recipe_id,
            name: self.recipe_name.clone(),
            default_servings: self.requested_servings,
            ingredients: self
                .scaled_ingredients
                .iter()
                .map(|i| Ingredient {
                    ingredient_id: i.ingredient_id,
                    name: i.ingredient_name.clone(),
                    quantity: i.scaled_quantity,
                    unit: i.unit.clone(),
                    preparation: i.preparation.clone(),
                    is_optional: i.is_optional,
                })
                .collect(),
            steps: self
                .scaled_steps
                .iter()
                .map(|s| Step {
                    step_id: s.step_id,
                    order_index: s.order_index,
                    instruction: s.instruction.clone(),
                    has_timer: s.has_timer,
                    timer_seconds: s.scaled_timer_seconds,
                    timer_label: s.timer_label.clone(),
                    is_parallel: s.is_parallel,
                    parallel_group: s.parallel_group,
                    can_start_early: s.can_start_early,
                    tips: s.tips.clone(),
                })
                .collect(),
        }
    }

    pub fn step(&self, step_id: StepId) -> Option<&ScaledStep> {
        self.scaled_steps.iter().find(|s| s.step_id == step_id)
    }
}

/// Scale a recipe to `target_servings`.
///
/// Quantities are multiplied by `target_servings / default_servings`. Timer
/// seconds are multiplied by the same factor and rounded to whole seconds,
/// ties rounding up. Step order, text and flags are never touched.
pub fn scale(recipe: &Recipe, target_servings: u32) -> Result<ScaledRecipe> {
    validate_recipe(recipe)?;
    if target_servings == 0 {
        return Err(TimerError::InvalidInput(
            "target servings must be a positive integer".to_string(),
        ));
    }

    let factor = f64::from(target_servings) / f64::from(recipe.default_servings);
    debug!(
        "Scaling recipe '{}' from {} to {} servings (factor: {})",
        recipe.name, recipe.default_servings, target_servings, factor
    );

    let scaled_ingredients = recipe
        .ingredients
        .iter()
        .map(|ingredient| ScaledIngredient {
            ingredient_id: ingredient.ingredient_id,
            ingredient_name: ingredient.name.clone(),
            original_quantity: ingredient.quantity,
            scaled_quantity: ingredient.quantity * factor,
            unit: ingredient.unit.clone(),
            preparation: ingredient.preparation.clone(),
            is_optional: ingredient.is_optional,
        })
        .collect();

    let scaled_steps = recipe
        .steps
        .iter()
        .map(|step| {
            Ok(ScaledStep {
                step_id: step.step_id,
                order_index: step.order_index,
                instruction: step.instruction.clone(),
                has_timer: step.has_timer,
                original_timer_seconds: step.timer_seconds,
                scaled_timer_seconds: scale_timer(step, factor)?,
                timer_label: step.timer_label.clone(),
                is_parallel: step.is_parallel,
                parallel_group: step.parallel_group,
                can_start_early: step.can_start_early,
                tips: step.tips.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ScaledRecipe {
        recipe_id: recipe.recipe_id,
        recipe_name: recipe.name.clone(),
        original_servings: recipe.default_servings,
        requested_servings: target_servings,
        scaling_factor: factor,
        scaled_ingredients,
        scaled_steps,
    })
}

/// Multiply whole seconds by `factor`, rounded to whole seconds.
///
/// `f64::round` rounds half away from zero, which is "ties up" for durations.
/// Callers range-check the result before narrowing it.
pub(crate) fn scale_seconds(seconds: i64, factor: f64) -> f64 {
    (seconds as f64 * factor).round()
}

fn scale_timer(step: &Step, factor: f64) -> Result<Option<u32>> {
    let Some(seconds) = step.timer_seconds else {
        return Ok(None);
    };
    let scaled = scale_seconds(i64::from(seconds), factor);
    if scaled > f64::from(u32::MAX) {
        return Err(TimerError::InvalidInput(format!(
            "step {} timer of {}s is too long once scaled by {}",
            step.step_id, seconds, factor
        )));
    }
    Ok(Some(scaled as u32))
}

fn validate_recipe(recipe: &Recipe) -> Result<()> {
    if recipe.default_servings == 0 {
        return Err(TimerError::InvalidInput(format!(
            "recipe '{}' has zero default servings",
            recipe.name
        )));
    }

    if let Some(bad) = recipe
        .ingredients
        .iter()
        .find(|i| !i.quantity.is_finite() || i.quantity < 0.0)
    {
        return Err(TimerError::InvalidInput(format!(
            "ingredient '{}' has invalid quantity {}",
            bad.name, bad.quantity
        )));
    }

    let mut seen = HashSet::new();
    for step in &recipe.steps {
        if !seen.insert(step.step_id) {
            return Err(TimerError::InvalidInput(format!(
                "step {} appears more than once",
                step.step_id
            )));
        }
        if step.has_timer && step.timer_seconds.is_none() {
            return Err(TimerError::InvalidInput(format!(
                "step {} has a timer but no duration",
                step.step_id
            )));
        }
    }

    Ok(())
}
