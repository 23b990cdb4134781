//! Per-IP Rate Limiting
//!
//! Fixed-window counter per client IP. Requests over the limit are answered
//! with `429` immediately; nothing is queued.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};

use crate::observability::{Event, MetricsRegistry};
use crate::service::ErrorResponse;

/// Windows kept before stale ones are swept
const SWEEP_THRESHOLD: usize = 10_000;

/// Per-client windows plus the time of the last stale sweep
#[derive(Debug, Default)]
struct LimiterState {
    windows: HashMap<String, (u32, DateTime<Utc>)>,
    last_sweep: Option<DateTime<Utc>>,
}

impl LimiterState {
    /// Drop expired windows, at most once per `window`
    fn sweep(&mut self, now: DateTime<Utc>, window: Duration) {
        if self.windows.len() <= SWEEP_THRESHOLD {
            return;
        }
        if matches!(self.last_sweep, Some(last) if now - last < window) {
            return;
        }
        self.windows.retain(|_, (_, started)| now - *started < window);
        self.last_sweep = Some(now);
    }
}

/// Fixed-window limiter keyed by client address
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<LimiterState>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl RateLimiter {
    /// `max_requests` per `window_secs`; a limit of 0 admits everything
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::seconds(window_secs.max(1) as i64),
            state: Mutex::new(LimiterState::default()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    /// Count one request from `client`; false when it is over the limit
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Utc::now())
    }

    fn check_at(&self, client: &str, now: DateTime<Utc>) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let Ok(mut state) = self.state.lock() else {
            // Fail open on a poisoned lock.
            return true;
        };

        state.sweep(now, self.window);

        let entry = state.windows.entry(client.to_string()).or_insert((0, now));

        // Reset if in new window
        if now - entry.1 >= self.window {
            entry.0 = 0;
            entry.1 = now;
        }

        if entry.0 >= self.max_requests {
            return false;
        }

        entry.0 += 1;
        true
    }
}

/// Client address: `X-Real-IP`, then the first `X-Forwarded-For` hop, then
/// the socket peer
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = header("x-real-ip") {
        return ip.to_string();
    }
    if let Some(ip) = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return ip.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware rejecting requests over the per-IP limit
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(request.headers(), peer);

    if !limiter.check(&client) {
        if let Some(metrics) = &limiter.metrics {
            metrics.increment_rate_limited();
        }
        tracing::warn!(event = %Event::RateLimited, client = %client);
        let body = ErrorResponse {
            error: "rate limit exceeded".to_string(),
            code: 429,
        };
        return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    }

    next.run(request).await
}
