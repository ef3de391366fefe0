//! Per-IP rate limiting.
//!
//! Two keyed GCRA limiters share the client IP as key. The general one wraps
//! the whole router, the stricter auth one only `/api/auth`. A rejected
//! request becomes [`AppError::RateLimited`] with a `Retry-After` header.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::RateLimiter;
use inkwell_config::RateLimitConfig;
use inkwell_core::AppError;
use tracing::warn;

use crate::state::AppState;

pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

#[derive(Clone)]
pub struct RateLimiters {
    pub general: Arc<IpLimiter>,
    pub auth: Arc<IpLimiter>,
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            general: Arc::new(RateLimiter::keyed(config.general_quota())),
            auth: Arc::new(RateLimiter::keyed(config.auth_quota())),
        }
    }

    /// Drops state for keys whose buckets are full again.
    pub fn retain_recent(&self) {
        self.general.retain_recent();
        self.auth.retain_recent();
    }
}

impl fmt::Debug for RateLimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiters")
            .field("general_keys", &self.general.len())
            .field("auth_keys", &self.auth.len())
            .finish()
    }
}

/// Client address: first `X-Forwarded-For` hop, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn request_ip(req: &Request) -> String {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_ip(req.headers(), peer)
}

async fn enforce(limiter: &IpLimiter, scope: &str, req: Request, next: Next) -> Response {
    let ip = request_ip(&req);

    match limiter.check_key(&ip) {
        Ok(()) => next.run(req).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            warn!(ip = %ip, scope, retry_after_secs = wait.as_secs(), "Rate limit exceeded");

            let mut response = AppError::RateLimited.into_response();
            // Round up so clients never retry a moment too early.
            let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

pub async fn rate_limit_general(State(state): State<AppState>, req: Request, next: Next) -> Response {
    enforce(&state.limiters.general, "general", req, next).await
}

pub async fn rate_limit_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    enforce(&state.limiters.auth, "auth", req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_for_first_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn test_falls_back_to_peer_then_unknown() {
        let peer: SocketAddr = "192.0.2.10:4000".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "192.0.2.10");
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_limiter_rejects_after_burst() {
        let config = RateLimitConfig {
            general_per_second: 1,
            general_burst_size: 2,
            auth_per_second: 1,
            auth_burst_size: 1,
        };
        let limiters = RateLimiters::new(&config);
        let key = "198.51.100.1".to_string();

        assert!(limiters.general.check_key(&key).is_ok());
        assert!(limiters.general.check_key(&key).is_ok());
        assert!(limiters.general.check_key(&key).is_err());

        // Separate keys have separate buckets.
        assert!(limiters.general.check_key(&"198.51.100.2".to_string()).is_ok());
    }
}
