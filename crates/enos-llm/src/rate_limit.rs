//! Per-model token-bucket rate limiting with a blocking, cancellable acquire.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

struct Bucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(capacity: u32, window: Duration) -> Self {
        let refill_per_sec = capacity as f64 / window.as_secs_f64().max(f64::EPSILON);
        Self {
            capacity: capacity as f64,
            tokens: capacity as f64,
            refill_per_sec,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_next_token(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 || self.refill_per_sec <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64((1.0 - self.tokens) / self.refill_per_sec)
    }
}

/// Error returned when an acquire is abandoned because its `CancellationToken`
/// fired first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireCancelled;

/// Token-bucket limiter, one bucket per model id.
pub struct TokenBucketLimiter {
    capacity: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl TokenBucketLimiter {
    #[must_use]
    pub fn new(requests_per_window: u32, window: Duration) -> Self {
        Self {
            capacity: requests_per_window,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Block (async-sleeping, not busy-spinning) until a token for
    /// `model_id` is available, or return `Err` if `cancel` fires first.
    pub async fn acquire(&self, model_id: &str, cancel: &CancellationToken) -> Result<(), AcquireCancelled> {
        loop {
            if cancel.is_cancelled() {
                return Err(AcquireCancelled);
            }
            let wait = {
                let mut buckets = self.buckets.lock();
                let bucket = buckets
                    .entry(model_id.to_string())
                    .or_insert_with(|| Bucket::new(self.capacity, self.window));
                if bucket.try_consume() {
                    return Ok(());
                }
                bucket.time_until_next_token()
            };
            tokio::select! {
                () = cancel.cancelled() => return Err(AcquireCancelled),
                () = tokio::time::sleep(wait.max(Duration::from_millis(1))) => {}
            }
        }
    }

    #[must_use]
    pub fn available(&self, model_id: &str) -> f64 {
        let mut buckets = self.buckets.lock();
        buckets
            .entry(model_id.to_string())
            .or_insert_with(|| Bucket::new(self.capacity, self.window))
            .tap_refill()
    }
}

impl Bucket {
    fn tap_refill(&mut self) -> f64 {
        self.refill();
        self.tokens
    }
}
