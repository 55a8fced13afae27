//! Rate limiting middleware for the krishimitra-service API.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::SecurityConfig;

/// Fixed-window request counters per client IP.
#[derive(Debug, Default)]
pub struct RateLimitState {
    requests: RwLock<HashMap<IpAddr, RateLimitEntry>>,
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request from `ip`.
    ///
    /// Returns `Err((limit, retry_after_secs))` once the window's budget is spent.
    pub async fn check_rate_limit(
        &self,
        ip: IpAddr,
        max_requests: u32,
        window_secs: u64,
    ) -> Result<(), (u32, u64)> {
        let window = Duration::from_secs(window_secs);
        let now = Instant::now();

        let mut requests = self.requests.write().await;
        let entry = requests.entry(ip).or_insert_with(|| RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count = entry.count.saturating_add(1);

        if entry.count > max_requests {
            let remaining_secs = window
                .checked_sub(now.duration_since(entry.window_start))
                .map(|d| d.as_secs().max(1))
                .unwrap_or(1);
            Err((max_requests, remaining_secs))
        } else {
            Ok(())
        }
    }

    /// Drop entries whose window ended long ago.
    pub async fn cleanup(&self, window_secs: u64) {
        let window = Duration::from_secs(window_secs);
        let now = Instant::now();

        let mut requests = self.requests.write().await;
        let before = requests.len();
        requests.retain(|_, entry| now.duration_since(entry.window_start) < window * 2);
        debug!("Rate limit cleanup removed {} entries", before - requests.len());
    }

    /// Number of tracked clients.
    pub async fn tracked_clients(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// Rate limiting middleware.
///
/// Limits requests per IP address within a time window and answers 429 Too
/// Many Requests with a `Retry-After` header once the limit is exceeded.
/// Requests without connection info pass through unchecked.
pub async fn rate_limit(
    State((config, state)): State<(Arc<SecurityConfig>, Arc<RateLimitState>)>,
    request: Request,
    next: Next,
) -> Response {
    if !config.rate_limit_enabled {
        return next.run(request).await;
    }

    let Some(ip) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return next.run(request).await;
    };

    match state
        .check_rate_limit(
            ip,
            config.rate_limit_requests,
            config.rate_limit_window_secs,
        )
        .await
    {
        Ok(()) => next.run(request).await,
        Err((limit, retry_after)) => {
            warn!("Rate limit exceeded for {} on {}", ip, request.uri().path());
            (
                StatusCode::TOO_MANY_REQUESTS,
                [
                    ("Retry-After", retry_after.to_string()),
                    ("X-RateLimit-Limit", limit.to_string()),
                    ("X-RateLimit-Remaining", "0".to_string()),
                ],
                Json(serde_json::json!({
                    "error": "Too many requests",
                    "retry_after": retry_after
                })),
            )
                .into_response()
        }
    }
}
