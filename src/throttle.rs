use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tracing::warn;

const LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Per-client token buckets guarding the analysis endpoints. A full
/// scan of the corpus is expensive, so clients get `burst` immediate
/// runs and then `rate_per_sec` refills.
#[derive(Clone)]
pub struct Throttle {
    buckets: Arc<DashMap<String, Bucket>>,
    rate_per_sec: f64,
    burst: f64,
    dropped_since_log: Arc<AtomicU64>,
    last_log: Arc<Mutex<Instant>>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Throttle {
    pub fn new(rate_per_sec: u32, burst: u32) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            rate_per_sec: rate_per_sec as f64,
            burst: burst as f64,
            dropped_since_log: Arc::new(AtomicU64::new(0)),
            last_log: Arc::new(Mutex::new(Instant::now())),
        }
    }

    fn allow(&self, client: &str) -> bool {
        let mut bucket = self
            .buckets
            .entry(client.to_string())
            .or_insert_with(|| Bucket {
                tokens: self.burst,
                last_refill: Instant::now(),
            });
        let now = Instant::now();
        let elapsed = now
            .saturating_duration_since(bucket.last_refill)
            .as_secs_f64();
        if elapsed > 0.0 {
            bucket.tokens = (bucket.tokens + elapsed * self.rate_per_sec).min(self.burst);
            bucket.last_refill = now;
        }
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn note_drop(&self) {
        self.dropped_since_log.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        let mut last = self.last_log.lock().unwrap();
        if now.saturating_duration_since(*last) >= LOG_INTERVAL {
            let dropped = self.dropped_since_log.swap(0, Ordering::Relaxed);
            if dropped > 0 {
                warn!("throttle dropped {dropped} requests in the last minute");
            }
            *last = now;
        }
    }
}

/// Middleware entry point. Requests without a forwarded client address
/// (direct connections, tests) pass through unthrottled.
pub async fn limit(State(throttle): State<Throttle>, request: Request, next: Next) -> Response {
    let client = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    if let Some(client) = client {
        if !throttle.allow(&client) {
            throttle.note_drop();
            return (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_then_deny() {
        let throttle = Throttle::new(1, 3);
        for _ in 0..3 {
            assert!(throttle.allow("10.0.0.1"));
        }
        assert!(!throttle.allow("10.0.0.1"));
    }

    #[test]
    fn clients_have_independent_buckets() {
        let throttle = Throttle::new(1, 1);
        assert!(throttle.allow("10.0.0.1"));
        assert!(!throttle.allow("10.0.0.1"));
        assert!(throttle.allow("10.0.0.2"));
    }
}
