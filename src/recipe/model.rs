//! Base recipe structures as delivered by the recipe service

use serde::{Deserialize, Serialize};

/// Identifier of a recipe step; also the key of its timer
pub type StepId = u64;

/// Identifier of a parallel group within one recipe
pub type GroupId = u32;

/// A recipe at its default serving count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub recipe_id: u64,
    pub name: String,
    pub default_servings: u32,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One ingredient line with its base quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub ingredient_id: u64,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub preparation: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
}

/// One cooking instruction, optionally carrying a timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub step_id: StepId,
    pub order_index: u32,
    pub instruction: String,
    #[serde(default)]
    pub has_timer: bool,
    #[serde(default)]
    pub timer_seconds: Option<u32>,
    #[serde(default)]
    pub timer_label: Option<String>,
    #[serde(default)]
    pub is_parallel: bool,
    #[serde(default)]
    pub parallel_group: Option<GroupId>,
    /// May begin before its predecessor in the group finishes
    #[serde(default)]
    pub can_start_early: bool,
    #[serde(default)]
    pub tips: Option<String>,
}
