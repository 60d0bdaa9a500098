//! Fixed-window rate limiting for the AI-backed routes.
//!
//! `AppState` carries an `Arc<dyn RateLimitBackend>`. The default backend keeps
//! counters in process memory; `RedisRateLimiter` shares them across instances
//! and is selected at startup when `REDIS_URL` is set.

pub mod memory;
pub mod redis_backend;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::CLERK_USER_HEADER;
use crate::errors::AppError;

pub use self::memory::MemoryRateLimiter;
pub use self::redis_backend::RedisRateLimiter;

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Outcome of counting one request against a token's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_after: Duration,
}

#[async_trait]
pub trait RateLimitBackend: Send + Sync {
    /// Counts one request for `token` and decides whether it may proceed.
    async fn check(&self, token: &str) -> Result<RateLimitDecision, AppError>;
}

pub type SharedRateLimiter = Arc<dyn RateLimitBackend>;

/// Axum middleware rejecting requests over the limit with 429.
pub async fn enforce_rate_limit(
    State(limiter): State<SharedRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = rate_limit_token(request.headers());
    let decision = limiter.check(&token).await?;

    if !decision.allowed {
        warn!("Rate limit exceeded for {token}");
        return Err(AppError::RateLimited {
            retry_after_secs: decision.reset_after.as_secs().max(1),
        });
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));
    Ok(response)
}

/// Picks the identity a request is counted against: the authenticated user,
/// else the first forwarded client IP.
pub fn rate_limit_token(headers: &HeaderMap) -> String {
    if let Some(user) = header_str(headers, CLERK_USER_HEADER) {
        return format!("user:{user}");
    }
    if let Some(ip) = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return format!("ip:{ip}");
    }
    "anonymous".to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn limited_router(max_requests: u32) -> Router {
        let limiter: SharedRateLimiter =
            Arc::new(MemoryRateLimiter::new(max_requests, Duration::from_secs(60)));
        Router::new()
            .route("/limited", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(limiter, enforce_rate_limit))
    }

    fn request_as(user: &str) -> Request {
        Request::builder()
            .uri("/limited")
            .header(CLERK_USER_HEADER, user)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_token_prefers_user_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CLERK_USER_HEADER, HeaderValue::from_static("user_123"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        assert_eq!(rate_limit_token(&headers), "user:user_123");
    }

    #[test]
    fn test_token_falls_back_to_first_forwarded_ip() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(rate_limit_token(&headers), "ip:203.0.113.9");
    }

    #[test]
    fn test_token_anonymous_without_headers() {
        assert_eq!(rate_limit_token(&HeaderMap::new()), "anonymous");
    }

    #[tokio::test]
    async fn test_middleware_rejects_request_over_limit() {
        let app = limited_router(2);

        for expected_remaining in ["1", "0"] {
            let response = app.clone().oneshot(request_as("alice")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers().get(REMAINING_HEADER).unwrap(),
                expected_remaining
            );
        }

        let response = app.clone().oneshot(request_as("alice")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));

        // Other users keep their own window
        let response = app.oneshot(request_as("bob")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
