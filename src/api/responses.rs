//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::TimerError,
    plan::OrchestrationPlan,
    state::SessionSnapshot,
};

/// API response structure for command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub session: Option<SessionSnapshot>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, session: Option<SessionSnapshot>) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            session,
        }
    }

    pub fn ok(message: String, session: Option<SessionSnapshot>) -> Self {
        Self::new("ok".to_string(), message, session)
    }

    /// Create an error response
    pub fn error(message: String) -> Self {
        Self::new("error".to_string(), message, None)
    }
}

/// Full view of the open session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session: SessionSnapshot,
    pub plan: OrchestrationPlan,
    pub uptime: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Engine error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub TimerError);

impl From<TimerError> for ApiError {
    fn from(error: TimerError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self.0 {
            TimerError::InvalidInput(_) | TimerError::InvalidOrchestrationPlan(_) => {
                StatusCode::BAD_REQUEST
            }
            TimerError::DuplicateTimer(_) | TimerError::StepNotReady { .. } => StatusCode::CONFLICT,
            TimerError::NoSession => StatusCode::NOT_FOUND,
            TimerError::StateUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ApiResponse::error(self.0.to_string()))).into_response()
    }
}
