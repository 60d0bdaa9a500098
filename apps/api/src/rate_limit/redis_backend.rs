use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::{info, warn};

use super::{RateLimitBackend, RateLimitDecision};
use crate::errors::AppError;

const KEY_PREFIX: &str = "ratelimit:";

/// Fixed-window counter stored in Redis so every instance sees the same limits.
/// The window starts with the first `INCR` and ends when the key expires.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    max_requests: u32,
    window: Duration,
}

impl RedisRateLimiter {
    pub async fn connect(
        redis_url: &str,
        max_requests: u32,
        window: Duration,
    ) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url).context("Invalid REDIS_URL")?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .context("Failed to connect to Redis")?;
        info!("Redis rate limiter connected");
        Ok(Self {
            conn,
            max_requests,
            window,
        })
    }

    /// Bumps the window counter and returns it with the seconds left in the window.
    async fn count(&self, key: &str) -> redis::RedisResult<(u64, i64)> {
        let mut conn = self.conn.clone();
        let (count, ttl): (u64, i64) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(key)
            .cmd("TTL")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        if !missing_expiry(ttl) {
            return Ok((count, ttl));
        }

        // Covers the first hit of a window and a key whose earlier EXPIRE was lost.
        let window_secs = self.window.as_secs().max(1);
        redis::cmd("EXPIRE")
            .arg(key)
            .arg(window_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok((count, i64::try_from(window_secs).unwrap_or(i64::MAX)))
    }
}

#[async_trait]
impl RateLimitBackend for RedisRateLimiter {
    async fn check(&self, token: &str) -> Result<RateLimitDecision, AppError> {
        let key = format!("{KEY_PREFIX}{token}");
        match self.count(&key).await {
            Ok((count, ttl)) => Ok(decide(count, ttl, self.max_requests, self.window)),
            Err(e) => {
                // Fail open while Redis is unreachable.
                warn!("Redis rate limit check failed, allowing request: {e}");
                Ok(RateLimitDecision {
                    allowed: true,
                    remaining: self.max_requests,
                    reset_after: self.window,
                })
            }
        }
    }
}

/// `TTL` answers -1 for a key that exists without an expiry.
fn missing_expiry(ttl_secs: i64) -> bool {
    ttl_secs == -1
}

/// Turns a window counter and its remaining TTL into a decision.
/// A negative TTL (key without expiry) falls back to the full window.
fn decide(count: u64, ttl_secs: i64, max_requests: u32, window: Duration) -> RateLimitDecision {
    let reset_after = if ttl_secs >= 0 {
        Duration::from_secs(ttl_secs as u64)
    } else {
        window
    };
    let used = u32::try_from(count).unwrap_or(u32::MAX);
    RateLimitDecision {
        allowed: used <= max_requests,
        remaining: max_requests.saturating_sub(used),
        reset_after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_within_limit() {
        let d = decide(3, 40, 5, Duration::from_secs(60));
        assert!(d.allowed);
        assert_eq!(d.remaining, 2);
        assert_eq!(d.reset_after, Duration::from_secs(40));
    }

    #[test]
    fn test_decide_over_limit() {
        let d = decide(6, 12, 5, Duration::from_secs(60));
        assert!(!d.allowed);
        assert_eq!(d.remaining, 0);
    }

    #[test]
    fn test_key_without_expiry_gets_one() {
        // A fresh key and one left behind by a failed EXPIRE look the same.
        assert!(missing_expiry(-1));
        assert!(!missing_expiry(0));
        assert!(!missing_expiry(42));
    }

    #[test]
    fn test_counter_past_limit_recovers_once_expiry_is_restored() {
        let window = Duration::from_secs(60);
        // A restored expiry reports the full window, so the key clears.
        let d = decide(57, 60, 5, window);
        assert!(!d.allowed);
        assert_eq!(d.reset_after, window);
    }

    #[test]
    fn test_decide_missing_ttl_uses_window() {
        let d = decide(1, -1, 5, Duration::from_secs(60));
        assert_eq!(d.reset_after, Duration::from_secs(60));
    }
}
