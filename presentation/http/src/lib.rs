//! HTTP presentation layer for chatrelay
//!
//! Serves `POST /chat` and `GET /health` over axum and maps core errors to
//! JSON error bodies.

use async_trait::async_trait;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::Json,
    routing::{get, post},
    Router,
};
use chatrelay_core::prelude::*;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

mod handlers;
mod middleware;
mod models;

pub use middleware::RateLimiter;
pub use models::*;

/// Message returned to clients whenever the provider call fails
pub const PROVIDER_FAILURE_MESSAGE: &str = "Failed to get AI response. Please try again.";

/// HTTP bridge server configuration
#[derive(Debug, Clone)]
pub struct HttpBridgeConfig {
    /// Server bind address
    pub bind_address: SocketAddr,
    /// Allowed origins (comma separated); any origin when unset
    pub cors_origin: Option<String>,
    /// Enable CORS
    pub enable_cors: bool,
    /// Request timeout in seconds; must outlast the connector's retries
    /// so provider timeouts reach the client as 504
    pub request_timeout: u64,
    /// Maximum accepted request body in bytes
    pub body_limit_bytes: usize,
    /// Requests per minute across the process; 0 disables the limiter
    pub rate_limit_per_minute: u32,
    /// Return internal error messages to clients instead of a generic one
    pub expose_internal_errors: bool,
}

impl Default for HttpBridgeConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_origin: None,
            enable_cors: true,
            request_timeout: 240,
            body_limit_bytes: 1024 * 1024,
            rate_limit_per_minute: 60,
            expose_internal_errors: false,
        }
    }
}

/// Axum-based presentation adapter
pub struct HttpBridge {
    config: HttpBridgeConfig,
    shutdown: Arc<Notify>,
}

impl HttpBridge {
    /// Create a new HTTP bridge
    pub fn new(config: HttpBridgeConfig) -> Self {
        Self {
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn config(&self) -> &HttpBridgeConfig {
        &self.config
    }
}

/// Build the Axum router with all routes and middleware
pub fn build_router(config: &HttpBridgeConfig, service: Arc<dyn ChatService>) -> Router {
    let app_state = AppState {
        service,
        expose_internal_errors: config.expose_internal_errors,
    };

    let mut router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/chat", post(handlers::chat::chat))
        .fallback(handlers::not_found)
        .with_state(app_state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(from_fn_with_state(
            Duration::from_secs(config.request_timeout),
            middleware::request_timeout,
        ))
        .layer(from_fn_with_state(
            RateLimiter::per_minute(config.rate_limit_per_minute),
            middleware::rate_limiting,
        ))
        .layer(from_fn(middleware::request_logging))
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ));

    if config.enable_cors {
        router = router.layer(cors_layer(config.cors_origin.as_deref()));
    }

    router.layer(TraceLayer::new_for_http())
}

fn cors_layer(cors_origin: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors_origin
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[async_trait]
impl PresentationAdapter for HttpBridge {
    async fn start(&self, service: Arc<dyn ChatService>) -> Result<(), PresentationError> {
        info!("Starting HTTP bridge on {}", self.config.bind_address);

        let router = build_router(&self.config, service);

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|e| {
                PresentationError::StartupFailed(format!("Failed to bind to {}: {}", self.config.bind_address, e))
            })?;

        info!("HTTP bridge listening on {}", self.config.bind_address);

        let shutdown = self.shutdown.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.notified().await })
            .await
            .map_err(|e| PresentationError::StartupFailed(format!("Server error: {}", e)))?;

        info!("HTTP bridge stopped");
        Ok(())
    }

    async fn stop(&self) -> Result<(), PresentationError> {
        info!("Stopping HTTP bridge");
        self.shutdown.notify_one();
        Ok(())
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn ChatService>,
    pub expose_internal_errors: bool,
}

/// Convert core errors to HTTP status codes and responses
pub fn handle_core_error(error: CoreError, expose_internal_errors: bool) -> (StatusCode, Json<ErrorBody>) {
    let (status, message) = match error {
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        CoreError::Serialization(e) => (StatusCode::BAD_REQUEST, format!("Invalid request format: {}", e)),
        CoreError::Llm(e) => {
            error!("Provider call failed: {}", e);
            let status = match e {
                LlmError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            };
            (status, PROVIDER_FAILURE_MESSAGE.to_string())
        }
        other => {
            error!("Internal error: {}", other);
            let message = if expose_internal_errors {
                other.to_string()
            } else {
                "Internal Server Error".to_string()
            };
            (StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    };

    if status.is_client_error() {
        warn!("API error: {} - {}", status, message);
    }
    (status, Json(ErrorBody::new(message)))
}
