use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{RateLimitBackend, RateLimitDecision};
use crate::errors::AppError;

/// Past this many tokens, stale windows are swept at most once per window.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: Instant,
}

/// Per-process fixed-window counter. A window rolls over lazily on the first
/// request after it has elapsed.
#[derive(Debug, Clone)]
pub struct MemoryRateLimiter {
    windows: Arc<DashMap<String, Window>>,
    last_sweep: Arc<Mutex<Instant>>,
    sweep_threshold: usize,
    max_requests: u32,
    window: Duration,
}

impl MemoryRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            last_sweep: Arc::new(Mutex::new(Instant::now())),
            sweep_threshold: SWEEP_THRESHOLD,
            max_requests,
            window,
        }
    }

    fn sweep_stale(&self, now: Instant) {
        if self.windows.len() <= self.sweep_threshold {
            return;
        }
        // Another caller holding the lock is already sweeping.
        let Ok(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last_sweep) < self.window {
            return;
        }
        *last_sweep = now;
        let window = self.window;
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started_at) < window);
    }

    fn check_at(&self, token: &str, now: Instant) -> RateLimitDecision {
        self.sweep_stale(now);

        let mut entry = self.windows.entry(token.to_string()).or_insert(Window {
            count: 0,
            started_at: now,
        });

        if now.saturating_duration_since(entry.started_at) >= self.window {
            entry.count = 0;
            entry.started_at = now;
        }
        entry.count = entry.count.saturating_add(1);

        let elapsed = now.saturating_duration_since(entry.started_at);
        RateLimitDecision {
            allowed: entry.count <= self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self.window.saturating_sub(elapsed),
        }
    }
}

#[async_trait]
impl RateLimitBackend for MemoryRateLimiter {
    async fn check(&self, token: &str) -> Result<RateLimitDecision, AppError> {
        Ok(self.check_at(token, Instant::now()))
    }
}
