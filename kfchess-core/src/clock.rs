//! Shared millisecond clocks

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic game time in milliseconds, readable from any thread
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock measured from construction, scaled by an integer time factor
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    origin: Instant,
    time_factor: u32,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::with_time_factor(1)
    }

    /// Game time runs `time_factor` times faster than wall time
    pub fn with_time_factor(time_factor: u32) -> Self {
        Self {
            origin: Instant::now(),
            time_factor: time_factor.max(1),
        }
    }

    pub fn time_factor(&self) -> u32 {
        self.time_factor
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> i64 {
        let elapsed = self.origin.elapsed().as_millis() as i64;
        elapsed.saturating_mul(self.time_factor as i64)
    }
}

/// Manually driven clock; clones share the same time
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    /// Move time forward and return the new reading
    pub fn advance(&self, delta_ms: i64) -> i64 {
        self.now.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
