//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::{
    recipe::{scale, ScaledRecipe, StepId},
    state::AppState,
};
use super::responses::{ApiError, ApiResponse, HealthResponse, SessionResponse};

#[derive(Debug, Deserialize)]
pub struct ServingsQuery {
    pub servings: u32,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub servings: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTimerRequest {
    pub step_id: StepId,
    pub duration_seconds: u64,
    pub label: String,
}

/// Handle GET /recipe/scaled - Scale the recipe without opening a session
pub async fn scaled_recipe_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ServingsQuery>,
) -> Result<Json<ScaledRecipe>, ApiError> {
    Ok(Json(scale(&state.recipe, query.servings)?))
}

/// Handle POST /session - Open (or reopen) a cooking session
pub async fn start_session_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let snapshot = state.begin_session(request.servings).await.map_err(|e| {
        error!("Failed to start cooking session: {}", e);
        e
    })?;
    info!("Session endpoint called - cooking {} servings", request.servings);
    Ok(Json(ApiResponse::ok(
        format!("Cooking session started for {} servings", request.servings),
        Some(snapshot),
    )))
}

/// Handle DELETE /session - End the cooking session
pub async fn end_session_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let message = if state.end_session().await? {
        "Cooking session ended"
    } else {
        "No cooking session was active"
    };
    Ok(Json(ApiResponse::ok(message.to_string(), None)))
}

/// Handle GET /session - Return the session, its plan and server metadata
pub async fn session_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let controller = state.controller()?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(SessionResponse {
        session: controller.snapshot()?,
        plan: controller.plan()?,
        uptime: state.get_uptime(),
        last_action,
        last_action_time,
    }))
}

/// Handle POST /session/steps/next
pub async fn next_step_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let controller = state.controller()?;
    let index = controller.advance_step()?;
    state.record_action("next-step");
    Ok(Json(ApiResponse::ok(
        format!("Current step is {}", index),
        Some(controller.snapshot()?),
    )))
}

/// Handle POST /session/steps/previous
pub async fn previous_step_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let controller = state.controller()?;
    let index = controller.retreat_step()?;
    state.record_action("previous-step");
    Ok(Json(ApiResponse::ok(
        format!("Current step is {}", index),
        Some(controller.snapshot()?),
    )))
}

/// Handle POST /session/steps/jump/:index
pub async fn jump_step_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<ApiResponse>, ApiError> {
    let controller = state.controller()?;
    let current = controller.jump_to_step(index)?;
    state.record_action("jump-step");
    Ok(Json(ApiResponse::ok(
        format!("Current step is {}", current),
        Some(controller.snapshot()?),
    )))
}

/// Handle POST /session/timers - Start an ad-hoc timer
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartTimerRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let controller = state.controller()?;
    let timer = controller.start_timer(request.step_id, request.duration_seconds, &request.label)?;
    state.record_action("timer-start");
    Ok(Json(ApiResponse::ok(
        format!("Timer '{}' started for {}s", timer.label, timer.duration_seconds),
        Some(controller.snapshot()?),
    )))
}

/// Handle POST /session/timers/:step_id/start - Start the planned timer for a step
pub async fn start_planned_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(step_id): Path<StepId>,
) -> Result<Json<ApiResponse>, ApiError> {
    let controller = state.controller()?;
    let timer = controller.start_planned_timer(step_id).map_err(|e| {
        warn!("Refused to start timer for step {}: {}", step_id, e);
        e
    })?;
    state.record_action("timer-start");
    Ok(Json(ApiResponse::ok(
        format!("Timer '{}' started for {}s", timer.label, timer.duration_seconds),
        Some(controller.snapshot()?),
    )))
}

/// Handle POST /session/timers/:step_id/pause
pub async fn pause_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(step_id): Path<StepId>,
) -> Result<Json<ApiResponse>, ApiError> {
    let controller = state.controller()?;
    controller.pause_timer(step_id)?;
    state.record_action("timer-pause");
    Ok(Json(ApiResponse::ok(
        format!("Pause requested for step {}", step_id),
        Some(controller.snapshot()?),
    )))
}

/// Handle POST /session/timers/:step_id/resume
pub async fn resume_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(step_id): Path<StepId>,
) -> Result<Json<ApiResponse>, ApiError> {
    let controller = state.controller()?;
    controller.resume_timer(step_id)?;
    state.record_action("timer-resume");
    Ok(Json(ApiResponse::ok(
        format!("Resume requested for step {}", step_id),
        Some(controller.snapshot()?),
    )))
}

/// Handle DELETE /session/timers/:step_id
pub async fn remove_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(step_id): Path<StepId>,
) -> Result<Json<ApiResponse>, ApiError> {
    let controller = state.controller()?;
    controller.remove_timer(step_id)?;
    state.record_action("timer-remove");
    Ok(Json(ApiResponse::ok(
        format!("Timer for step {} removed", step_id),
        Some(controller.snapshot()?),
    )))
}

/// Handle DELETE /session/timers - Drop every timer of the session
pub async fn clear_timers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let controller = state.controller()?;
    let cleared = controller.clear_timers()?;
    state.record_action("timer-clear");
    Ok(Json(ApiResponse::ok(
        format!("{} timers cleared", cleared),
        Some(controller.snapshot()?),
    )))
}

/// Handle GET /session/events - Stream timer lifecycle events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let receiver = state.controller()?.subscribe();

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(timer_event) => {
                    let event = match Event::default()
                        .event(timer_event.kind.as_str())
                        .json_data(&timer_event)
                    {
                        Ok(event) => event,
                        Err(e) => {
                            error!("Failed to encode timer event: {}", e);
                            continue;
                        }
                    };
                    return Some((Ok(event), receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
