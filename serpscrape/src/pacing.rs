//! Request pacing.
//!
//! Limiters are awaited immediately before each outbound request. The search
//! engine and crawled sites get separate limiters so the pacing of one never
//! delays the other.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tracing::trace;

/// Paces outbound requests.
#[async_trait]
pub trait RateLimiter: Send + Sync + Debug {
    /// Waits until the next request may be sent.
    async fn wait(&self);
}

/// Enforces a minimum interval between consecutive requests.
///
/// The first request is never delayed.
#[derive(Debug)]
pub struct MinIntervalLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl MinIntervalLimiter {
    /// Creates a limiter with the given minimum interval.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Gets the minimum interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Reserves the next slot and returns how long to sleep before using it.
    ///
    /// An interval that overflows `Instant` leaves the next slot unchanged.
    fn reserve(&self) -> Duration {
        let now = Instant::now();
        let mut next_slot = self.next_slot.lock();
        let slot = match *next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        *next_slot = Some(slot.checked_add(self.interval).unwrap_or(slot));
        slot - now
    }
}

#[async_trait]
impl RateLimiter for MinIntervalLimiter {
    async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let delay = self.reserve();
        if !delay.is_zero() {
            trace!(delay_ms = delay.as_millis() as u64, "Pacing request");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Sleeps a fixed delay before every request, including the first.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelayLimiter {
    delay: Duration,
}

impl FixedDelayLimiter {
    /// Creates a fixed-delay limiter.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl RateLimiter for FixedDelayLimiter {
    async fn wait(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// Never delays.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl RateLimiter for NoDelay {
    async fn wait(&self) {}
}
