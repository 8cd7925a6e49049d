//! Health check handlers

use crate::{models::ErrorBody, AppState, HealthStatus};
use axum::{extract::State, http::StatusCode, response::Json};

/// Health check endpoint
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, (StatusCode, Json<ErrorBody>)> {
    match state.service.health_check().await {
        Ok(_) => Ok(Json(HealthStatus::healthy())),
        Err(e) => {
            let error_msg = format!("Chat service unhealthy: {}", e);
            Err((StatusCode::SERVICE_UNAVAILABLE, Json(ErrorBody::new(error_msg))))
        }
    }
}
