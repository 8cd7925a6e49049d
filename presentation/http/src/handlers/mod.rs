//! HTTP request handlers for the bridge

pub mod chat;
pub mod health;

use crate::models::ErrorBody;
use axum::{http::StatusCode, http::Uri, response::Json};

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody::not_found(uri.path())))
}
