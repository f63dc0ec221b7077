//! Per-subject fixed-window request limiter.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tokio::sync::Mutex;
use tracing::warn;

use crate::auth::Subject;
use crate::error::ApiError;
use crate::state::ApiState;

const WINDOW: Duration = Duration::from_secs(60);
/// Tracked keys at which expired windows are swept before adding another.
const PRUNE_AT: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counts requests per key in fixed one-minute windows.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// `limit` requests per key per minute; 0 disables limiting.
    pub fn per_minute(limit: u32) -> Self {
        Self {
            limit,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request for `key` at `now`. Returns the time until the
    /// current window closes when the key is over its limit.
    pub async fn check(&self, key: &str, now: Instant) -> Result<(), Duration> {
        if self.limit == 0 {
            return Ok(());
        }
        let mut windows = self.windows.lock().await;
        if windows.len() >= PRUNE_AT && !windows.contains_key(key) {
            windows.retain(|_, window| now.saturating_duration_since(window.started) < WINDOW);
        }
        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= WINDOW {
            *window = Window {
                started: now,
                count: 0,
            };
        }
        if window.count >= self.limit {
            return Err(WINDOW.saturating_sub(now.duration_since(window.started)));
        }
        window.count += 1;
        Ok(())
    }
}

/// Middleware: reject a subject's request once it exceeds the limit.
/// Runs after [`require_auth`](crate::auth::require_auth).
pub async fn enforce(
    State(state): State<ApiState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let subject = req
        .extensions()
        .get::<Subject>()
        .map(|subject| subject.0.clone())
        .ok_or(ApiError::Unauthorized)?;

    if let Err(wait) = state.limiter.check(&subject, Instant::now()).await {
        let retry_after_secs = wait.as_secs().max(1);
        warn!(%subject, retry_after_secs, "rate limit exceeded");
        return Err(ApiError::RateLimited { retry_after_secs });
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn limits_each_key_within_a_window() {
        let limiter = RateLimiter::per_minute(2);
        let start = Instant::now();
        assert!(limiter.check("a", start).await.is_ok());
        assert!(limiter.check("a", start).await.is_ok());
        let wait = limiter.check("a", start + Duration::from_secs(15)).await;
        assert_eq!(wait, Err(Duration::from_secs(45)));
        assert!(limiter.check("b", start).await.is_ok());
    }

    #[tokio::test]
    async fn window_resets_after_a_minute() {
        let limiter = RateLimiter::per_minute(1);
        let start = Instant::now();
        assert!(limiter.check("a", start).await.is_ok());
        assert!(limiter.check("a", start).await.is_err());
        assert!(limiter.check("a", start + WINDOW).await.is_ok());
    }

    #[tokio::test]
    async fn expired_windows_are_dropped_once_the_map_is_full() {
        let limiter = RateLimiter::per_minute(5);
        let start = Instant::now();
        for n in 0..PRUNE_AT {
            assert!(limiter.check(&format!("subject-{n}"), start).await.is_ok());
        }
        assert_eq!(limiter.windows.lock().await.len(), PRUNE_AT);

        let later = start + Duration::from_secs(30);
        assert!(limiter.check("late", later).await.is_ok());
        assert_eq!(limiter.windows.lock().await.len(), PRUNE_AT + 1);

        assert!(limiter.check("fresh", start + WINDOW).await.is_ok());
        let windows = limiter.windows.lock().await;
        assert_eq!(windows.len(), 2);
        assert!(windows.contains_key("late"));
        assert!(windows.contains_key("fresh"));
    }

    #[tokio::test]
    async fn zero_disables_the_limit() {
        let limiter = RateLimiter::per_minute(0);
        let now = Instant::now();
        for _ in 0..100 {
            assert!(limiter.check("a", now).await.is_ok());
        }
    }
}
