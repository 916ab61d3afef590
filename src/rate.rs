//! Token-bucket gate for outbound API calls.
//!
//! One gate is shared by every fetch in the process. Token accounting runs
//! under a mutex; the deficit sleep happens after the lock is released so
//! waiting callers do not serialize each other's sleeps.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// Continuous-refill token bucket bounded at `burst` tokens.
pub struct RateGate {
    rate_per_sec: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

impl RateGate {
    pub fn new(rate_per_sec: f64, burst: u32) -> Self {
        Self {
            rate_per_sec,
            burst: f64::from(burst),
            bucket: Mutex::new(Bucket {
                tokens: f64::from(burst),
                refilled_at: Instant::now(),
            }),
        }
    }

    /// Take one token, returning immediately when one is available and
    /// otherwise sleeping for the exact deficit. Single-attempt wait: only
    /// one token is ever needed per call, so no re-check loop.
    pub async fn acquire(&self) {
        let wait = {
            let mut bucket = self.bucket.lock().await;
            let now = Instant::now();
            let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
            bucket.tokens = (bucket.tokens + elapsed * self.rate_per_sec).min(self.burst);
            bucket.refilled_at = now;
            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
                return;
            }
            let deficit = 1.0 - bucket.tokens;
            (deficit / self.rate_per_sec).max(0.01)
        };
        crate::metrics::record_rate_wait(wait);
        tokio::time::sleep(Duration::from_secs_f64(wait)).await;
    }
}
