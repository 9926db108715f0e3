//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/recipe/scaled", get(scaled_recipe_handler))
        .route(
            "/session",
            get(session_handler)
                .post(start_session_handler)
                .delete(end_session_handler),
        )
        .route("/session/events", get(events_handler))
        .route("/session/steps/next", post(next_step_handler))
        .route("/session/steps/previous", post(previous_step_handler))
        .route("/session/steps/jump/:index", post(jump_step_handler))
        .route(
            "/session/timers",
            post(start_timer_handler).delete(clear_timers_handler),
        )
        .route("/session/timers/:step_id", delete(remove_timer_handler))
        .route("/session/timers/:step_id/start", post(start_planned_timer_handler))
        .route("/session/timers/:step_id/pause", post(pause_timer_handler))
        .route("/session/timers/:step_id/resume", post(resume_timer_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
