//! Per-IP rate limiting
//!
//! Each client IP gets `max_requests` per fixed window. Responses carry
//! `RateLimit-Limit`, `RateLimit-Remaining` and `RateLimit-Reset`; rejected
//! requests get a 429 with `Retry-After`. WebSocket upgrades are exempt so a
//! dashboard can always reconnect its invalidation feed.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::api::ApiError;

const LIMITED_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Stale windows are swept once the table grows past this
const SWEEP_THRESHOLD: usize = 10_000;

const RATELIMIT_LIMIT: &str = "ratelimit-limit";
const RATELIMIT_REMAINING: &str = "ratelimit-remaining";
const RATELIMIT_RESET: &str = "ratelimit-reset";

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, reset: Duration },
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client IP
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count a request from `ip` at `now`
    pub fn check(&self, ip: IpAddr, now: Instant) -> Decision {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if clients.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = clients.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        let reset = self.window.saturating_sub(now.duration_since(entry.started));
        if entry.count >= self.max_requests {
            return Decision::Limited { retry_after: reset };
        }

        entry.count += 1;
        Decision::Allowed {
            remaining: self.max_requests - entry.count,
            reset,
        }
    }

    /// Number of tracked clients
    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Middleware enforcing a [`RateLimiter`]
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if is_websocket_upgrade(request.headers()) {
        return next.run(request).await;
    }

    let ip = client_ip(&request);
    match limiter.check(ip, Instant::now()) {
        Decision::Allowed { remaining, reset } => {
            let mut response = next.run(request).await;
            set_headers(response.headers_mut(), limiter.max_requests(), remaining, reset);
            response
        }
        Decision::Limited { retry_after } => {
            tracing::warn!(client_ip = %ip, "Rate limit exceeded");
            let mut response = ApiError::RateLimited(LIMITED_MESSAGE.to_string()).into_response();
            let headers = response.headers_mut();
            set_headers(headers, limiter.max_requests(), 0, retry_after);
            headers.insert(header::RETRY_AFTER, HeaderValue::from(ceil_secs(retry_after)));
            response
        }
    }
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Peer address from the listener; requests without one share a bucket
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

fn set_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset: Duration) {
    headers.insert(HeaderName::from_static(RATELIMIT_LIMIT), HeaderValue::from(limit));
    headers.insert(
        HeaderName::from_static(RATELIMIT_REMAINING),
        HeaderValue::from(remaining),
    );
    headers.insert(
        HeaderName::from_static(RATELIMIT_RESET),
        HeaderValue::from(ceil_secs(reset)),
    );
}
