//! Chat relay handler

use crate::{handle_core_error, models::ErrorBody, AppState, ChatResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use chatrelay_core::prelude::*;
use tracing::{debug, info, warn};

/// Relay a conversation and return the classified reply
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorBody>)> {
    let Json(request) = payload.map_err(reject_body)?;
    debug!(
        "Chat request with {} messages (format: {:?})",
        request.messages.len(),
        request.options.response_format
    );

    match state.service.chat(request).await {
        Ok(reply) => {
            info!(
                "Chat reply classified as {} ({} chars)",
                reply.reply.content_type(),
                reply.reply.content().len()
            );
            Ok(Json(ChatResponse::from(reply)))
        }
        Err(e) => Err(handle_core_error(e, state.expose_internal_errors)),
    }
}

/// Oversized bodies keep their 413; every other body problem is a 400
fn reject_body(rejection: JsonRejection) -> (StatusCode, Json<ErrorBody>) {
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    let message = rejection.body_text();
    warn!("Rejected chat body ({}): {}", status, message);
    (status, Json(ErrorBody::new(message)))
}
