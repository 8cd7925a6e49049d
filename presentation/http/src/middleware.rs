//! Middleware for the HTTP bridge

use crate::models::ErrorBody;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Request logging middleware
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start_time = Instant::now();

    debug!("Incoming request: {} {}", method, uri);

    let response = next.run(request).await;

    let duration = start_time.elapsed();
    let status = response.status();

    if status.is_success() {
        info!("{} {} - {} ({:?})", method, uri, status, duration);
    } else {
        warn!("{} {} - {} ({:?})", method, uri, status, duration);
    }

    response
}

/// Request timeout middleware
pub async fn request_timeout(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!("Request timed out after {:?}", limit);
            (
                StatusCode::REQUEST_TIMEOUT,
                Json(ErrorBody::new("Request timed out")),
            )
                .into_response()
        }
    }
}

/// Process-wide request quota shared by every connection
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Option<Arc<GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
}

impl RateLimiter {
    /// Allow bursts of `limit` requests, replenished evenly over `window`.
    /// A zero limit disables limiting.
    pub fn new(limit: u32, window: Duration) -> Self {
        let quota = NonZeroU32::new(limit).and_then(|burst| {
            Quota::with_period(window / burst.get()).map(|quota| quota.allow_burst(burst))
        });

        Self {
            limiter: quota.map(|quota| Arc::new(GovRateLimiter::direct(quota))),
        }
    }

    /// `limit` requests per minute; zero disables limiting
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Check if a request may proceed without waiting
    pub fn try_acquire(&self) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }
}

/// Rate limiting middleware
pub async fn rate_limiting(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    if !limiter.try_acquire() {
        warn!("Rate limit exceeded for {} {}", request.method(), request.uri());
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorBody::new("Too many requests")),
        )
            .into_response();
    }

    next.run(request).await
}
