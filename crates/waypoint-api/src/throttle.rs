//! Per-source-IP admission control for the /api routes.
//!
//! Each client IP gets a token bucket holding `max_requests_per_ip_per_minute`
//! tokens, refilled continuously over one minute. A request costs one token.
//! Empty bucket = 429. Buckets idle for an hour are dropped, and the table
//! never tracks more than `max_tracked_ips` addresses.
//!
//! This state lives entirely in the API layer and never touches the registry.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use waypoint_core::config::ThrottleConfig;

use crate::handlers::ApiError;

const IDLE_EVICT: Duration = Duration::from_secs(3600);
const REFILL_WINDOW_SECS: f64 = 60.0;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, refill_rate: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            capacity,
            refill_rate,
            last_refill: now,
        }
    }

    /// Returns true if the request may proceed.
    fn allow(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct Inner {
    buckets: DashMap<IpAddr, TokenBucket>,
    capacity: f64,
    refill_rate: f64,
    max_tracked: usize,
}

/// Shared handle to the per-IP bucket table.
#[derive(Debug, Clone)]
pub struct IpThrottle {
    inner: Arc<Inner>,
}

impl IpThrottle {
    /// `max_per_minute` of zero disables throttling.
    pub fn new(max_per_minute: u32, max_tracked: usize) -> Self {
        let capacity = max_per_minute as f64;
        Self {
            inner: Arc::new(Inner {
                buckets: DashMap::new(),
                capacity,
                refill_rate: capacity / REFILL_WINDOW_SECS,
                max_tracked: max_tracked.max(1),
            }),
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.max_requests_per_ip_per_minute, config.max_tracked_ips)
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.capacity >= 1.0
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    pub fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        if !self.is_enabled() {
            return true;
        }
        let inner = &self.inner;

        if !inner.buckets.contains_key(&ip) && inner.buckets.len() >= inner.max_tracked {
            self.evict(now);
        }

        let mut bucket = inner
            .buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(inner.capacity, inner.refill_rate, now));
        bucket.allow(now)
    }

    /// Number of addresses currently tracked.
    pub fn tracked(&self) -> usize {
        self.inner.buckets.len()
    }

    fn evict(&self, now: Instant) {
        let buckets = &self.inner.buckets;
        buckets.retain(|_, b| now.saturating_duration_since(b.last_refill) < IDLE_EVICT);

        while buckets.len() >= self.inner.max_tracked {
            let oldest = buckets
                .iter()
                .min_by_key(|e| e.value().last_refill)
                .map(|e| *e.key());
            match oldest {
                Some(ip) => {
                    buckets.remove(&ip);
                }
                None => break,
            }
        }
    }
}

/// axum middleware. Requests without a known peer address pass through.
pub async fn enforce(State(throttle): State<IpThrottle>, req: Request, next: Next) -> Response {
    if throttle.is_enabled() && req.uri().path().starts_with("/api/") {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        if let Some(ip) = peer {
            if !throttle.check(ip) {
                tracing::warn!(client = %ip, path = %req.uri().path(), "request throttled");
                return ApiError::too_many_requests().into_response();
            }
        }
    }
    next.run(req).await
}
