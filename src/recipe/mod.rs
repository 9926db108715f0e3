//! Recipe model and serving-count scaling
//!
//! Scaling is pure: the same recipe and servings always produce the same
//! scaled recipe, which is what the timer planner consumes.

pub mod model;
pub mod scaling;

// Re-export main types
pub use model::{GroupId, Ingredient, Recipe, Step, StepId};
pub use scaling::{scale, ScaledIngredient, ScaledRecipe, ScaledStep, DEFAULT_TIMER_LABEL};
