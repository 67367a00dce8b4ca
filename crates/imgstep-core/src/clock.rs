#![forbid(unsafe_code)]

//! Monotonic time sources.
//!
//! The runtime never reads the wall clock directly. It asks a [`Clock`] for
//! the time elapsed since an arbitrary origin and compares those durations
//! against its freshness and settle deadlines.
//!
//! - [`SystemClock`] wraps `web_time::Instant`, so it works both natively and
//!   on `wasm32-unknown-unknown` (where it reads `performance.now()`).
//! - [`DeterministicClock`] is advanced explicitly by the host or a test.
//!   Clones share the same time, so a test can keep a handle while the
//!   runtime owns another.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use web_time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now_mono(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_mono(&self) -> Duration {
        (**self).now_mono()
    }
}

/// Clock backed by the platform monotonic timer.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Deterministic monotonic clock controlled by the host.
///
/// Time is stored in whole microseconds.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    micros: Arc<AtomicU64>,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at `now`.
    #[must_use]
    pub fn starting_at(now: Duration) -> Self {
        let clock = Self::new();
        clock.set(now);
        clock
    }

    /// Set current monotonic time.
    pub fn set(&self, now: Duration) {
        self.micros.store(duration_to_micros(now), Ordering::SeqCst);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&self, dt: Duration) {
        let step = duration_to_micros(dt);
        let _ = self
            .micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(step))
            });
    }

    /// Advance monotonic time by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

fn duration_to_micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
