//! Rate limiting middleware for the checkout route.
//!
//! Sliding-window counters keyed by client network address plus a route
//! tag, built on Governor quotas with one limiter per key. Idle keys are
//! evicted once their window has fully elapsed, so memory stays bounded.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
};
use std::{
    num::NonZeroU32,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use orders_types::AppError;

use super::handlers::ApiError;

/// Sweep the key map once it holds this many entries.
const SWEEP_THRESHOLD: usize = 1024;

struct KeyEntry {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    last_hit: Mutex<Instant>,
}

/// Rate limiter state shared across requests.
pub struct RateGuard {
    limiters: DashMap<String, KeyEntry>,
    quota: Quota,
    window: Duration,
    /// Whether `x-forwarded-for` is trusted for client identity. Only
    /// safe behind a proxy that overwrites the header; otherwise the
    /// peer address is the identity and the header is ignored.
    trust_forwarded: bool,
    clock: DefaultClock,
}

impl Default for RateGuard {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60), false)
    }
}

impl RateGuard {
    /// Creates a new rate guard.
    ///
    /// # Arguments
    /// * `max_requests` - Number of requests allowed per trailing window
    /// * `window` - Length of the trailing window
    /// * `trust_forwarded` - Key on `x-forwarded-for` instead of the peer
    ///   address (deployments behind a proxy that sets the header)
    pub fn new(max_requests: u32, window: Duration, trust_forwarded: bool) -> Self {
        let max_requests = max_requests.max(1);
        // Replenish one permit per window/max so a full burst frees up
        // over one window, keeping the sustained rate at max/window.
        let quota = Quota::with_period(window / max_requests)
            .unwrap()
            .allow_burst(NonZeroU32::new(max_requests).unwrap());

        Self {
            limiters: DashMap::new(),
            quota,
            window,
            trust_forwarded,
            clock: DefaultClock::default(),
        }
    }

    /// Checks whether a request for `key` is allowed. On rejection the
    /// `Err` carries the retry-after hint.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        if self.limiters.len() > SWEEP_THRESHOLD {
            self.sweep();
        }

        let limiter = {
            let entry = self.limiters.entry(key.to_string()).or_insert_with(|| KeyEntry {
                limiter: Arc::new(RateLimiter::direct(self.quota)),
                last_hit: Mutex::new(Instant::now()),
            });
            *entry.last_hit.lock().unwrap() = Instant::now();
            entry.limiter.clone()
        };

        limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Drops keys whose window has fully elapsed since their last hit.
    fn sweep(&self) {
        let cutoff = Instant::now() - self.window;
        self.limiters
            .retain(|_, entry| *entry.last_hit.lock().unwrap() >= cutoff);
    }

    #[cfg(test)]
    fn key_count(&self) -> usize {
        self.limiters.len()
    }
}

/// Rate limiting middleware. Only the checkout-initiation route is
/// guarded; webhooks must never be throttled (the gateways would treat
/// 429 as a delivery failure and amplify retries).
pub async fn rate_limit_middleware(
    State(guard): State<Arc<RateGuard>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let is_checkout =
        request.method() == Method::POST && request.uri().path() == "/api/checkout/pix";
    if !is_checkout {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let key = format!(
        "{}:pix",
        client_address(guard.trust_forwarded, request.headers(), peer)
    );

    match guard.check(&key) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(key, "checkout request rate limited");
            ApiError(AppError::RateLimited {
                retry_after_seconds: retry_after.as_secs().max(1),
            })
            .into_response()
        }
    }
}

/// Client network address for keying. The peer address is authoritative;
/// the proxy header is consulted only when the deployment declares the
/// proxy trustworthy, since any client can set it to arbitrary values.
fn client_address(trust_forwarded: bool, headers: &HeaderMap, peer: Option<String>) -> String {
    if trust_forwarded {
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
        {
            return ip;
        }
    }
    peer.unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_request_in_window_is_rejected() {
        let guard = RateGuard::new(5, Duration::from_secs(60), false);
        for _ in 0..5 {
            assert!(guard.check("1.2.3.4:pix").is_ok());
        }
        let retry_after = guard.check("1.2.3.4:pix").unwrap_err();
        assert!(retry_after > Duration::ZERO);
    }

    #[test]
    fn keys_are_isolated() {
        let guard = RateGuard::new(1, Duration::from_secs(60), false);
        assert!(guard.check("1.1.1.1:pix").is_ok());
        assert!(guard.check("1.1.1.1:pix").is_err());
        assert!(guard.check("2.2.2.2:pix").is_ok());
    }

    #[test]
    fn full_quota_is_available_again_after_idle_window() {
        let guard = RateGuard::new(5, Duration::from_millis(200), false);
        for _ in 0..5 {
            assert!(guard.check("k:pix").is_ok());
        }
        assert!(guard.check("k:pix").is_err());

        std::thread::sleep(Duration::from_millis(300));

        // Every slot replenishes within one window, not just one.
        let allowed = (0..5).filter(|_| guard.check("k:pix").is_ok()).count();
        assert_eq!(allowed, 5);
    }

    #[test]
    fn sweep_evicts_idle_keys() {
        let guard = RateGuard::new(5, Duration::from_millis(10), false);
        for i in 0..10 {
            let _ = guard.check(&format!("key-{i}:pix"));
        }
        assert_eq!(guard.key_count(), 10);
        std::thread::sleep(Duration::from_millis(30));
        guard.sweep();
        assert_eq!(guard.key_count(), 0);
    }

    #[test]
    fn forwarded_header_is_ignored_unless_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());

        // Untrusted: the attacker-controlled header cannot pick the key.
        assert_eq!(
            client_address(false, &headers, Some("192.0.2.9".into())),
            "192.0.2.9"
        );
        let mut spoofed = HeaderMap::new();
        spoofed.insert("x-forwarded-for", "203.0.113.8".parse().unwrap());
        assert_eq!(
            client_address(false, &spoofed, Some("192.0.2.9".into())),
            client_address(false, &headers, Some("192.0.2.9".into()))
        );

        // Trusted proxy: first hop wins, peer is the proxy itself.
        assert_eq!(
            client_address(true, &headers, Some("10.0.0.1".into())),
            "203.0.113.7"
        );
        assert_eq!(
            client_address(true, &HeaderMap::new(), Some("10.0.0.1".into())),
            "10.0.0.1"
        );
        assert_eq!(client_address(false, &HeaderMap::new(), None), "unknown");
    }
}
