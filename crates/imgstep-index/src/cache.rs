#![forbid(unsafe_code)]

//! Staleness cache for the position index.
//!
//! [`PositionCache`] owns the most recent [`PositionIndex`] and hands it out
//! as an `Arc`, so repeated reads within the freshness window return the
//! *same* index, not an equal copy.
//!
//! # Usage
//!
//! ```ignore
//! let mut cache = PositionCache::new(IndexBuilder::default(), DEFAULT_FRESHNESS);
//! let stale = cache.stale_handle();
//!
//! // In a mutation callback:
//! stale.mark();
//!
//! // In the key handler:
//! let index = cache.get_positions(&host, clock.now_mono(), false);
//! ```
//!
//! # Invalidation
//!
//! Two paths force the next access to rescan regardless of age:
//! - [`PositionCache::invalidate()`] from the owner,
//! - [`StaleHandle::mark()`] from any clone of [`PositionCache::stale_handle()`].
//!
//! Both reset the recorded build time to "never built". Invalidation never
//! scans by itself; the rebuild is pulled by the next `get_positions` call.

use core::time::Duration;
use std::sync::Arc;

use tracing::trace;

use crate::host::DocumentHost;
use crate::index::{IndexBuilder, PositionIndex, ScanReport};
use crate::invalidation::StaleHandle;

/// Default freshness window.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_millis(100);

/// Statistics about cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    /// Reads answered from the cached index.
    pub hits: u64,
    /// Reads that rescanned the host.
    pub rebuilds: u64,
    /// Invalidations observed (owner calls and raised stale flags).
    pub invalidations: u64,
    /// Hit rate as a fraction (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Time-to-live cache around [`IndexBuilder`].
#[derive(Debug)]
pub struct PositionCache<E> {
    builder: IndexBuilder,
    freshness: Duration,
    current: Option<Arc<PositionIndex<E>>>,
    /// `None` means "never built" and forces a rebuild.
    built_at: Option<Duration>,
    stale: StaleHandle,
    last_report: ScanReport,
    hits: u64,
    rebuilds: u64,
    invalidations: u64,
}

impl<E> PositionCache<E> {
    /// Create an empty cache.
    #[must_use]
    pub fn new(builder: IndexBuilder, freshness: Duration) -> Self {
        Self {
            builder,
            freshness,
            current: None,
            built_at: None,
            stale: StaleHandle::new(),
            last_report: ScanReport::default(),
            hits: 0,
            rebuilds: 0,
            invalidations: 0,
        }
    }

    /// Handle that external callbacks use to mark the index stale.
    #[must_use]
    pub fn stale_handle(&self) -> StaleHandle {
        self.stale.clone()
    }

    /// Force the next access to rebuild.
    pub fn invalidate(&mut self) {
        self.built_at = None;
        self.invalidations += 1;
    }

    /// Whether the next non-forced read at `now` would be served from cache.
    #[must_use]
    pub fn is_fresh(&self, now: Duration) -> bool {
        match (self.current.as_ref(), self.built_at) {
            (Some(_), Some(built_at)) => {
                !self.stale.is_marked() && now.saturating_sub(built_at) < self.freshness
            }
            _ => false,
        }
    }

    /// The last index built, without checking freshness.
    #[must_use]
    pub fn peek(&self) -> Option<&Arc<PositionIndex<E>>> {
        self.current.as_ref()
    }

    /// Report of the last rebuild.
    #[must_use]
    pub fn last_report(&self) -> ScanReport {
        self.last_report
    }

    /// The configured freshness window.
    #[must_use]
    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Get current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.rebuilds;
        CacheStats {
            hits: self.hits,
            rebuilds: self.rebuilds,
            invalidations: self.invalidations,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Reset statistics counters to zero.
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.rebuilds = 0;
        self.invalidations = 0;
    }

    /// Return the position index, rescanning `host` when needed.
    ///
    /// Unless `force` is set, a non-empty index built less than the freshness
    /// window before `now` is returned unchanged (same `Arc`). An empty index
    /// is never reused: a page with no qualifying images yet is rescanned on
    /// every read. A raised stale flag or a prior
    /// [`invalidate`](Self::invalidate) always rescans.
    pub fn get_positions<H>(&mut self, host: &H, now: Duration, force: bool) -> Arc<PositionIndex<E>>
    where
        H: DocumentHost<Element = E>,
    {
        if self.stale.take() {
            self.invalidate();
        }

        if !force
            && let (Some(index), Some(built_at)) = (self.current.as_ref(), self.built_at)
            && !index.is_empty()
            && now.saturating_sub(built_at) < self.freshness
        {
            self.hits += 1;
            trace!(images = index.len(), "position index cache hit");
            return Arc::clone(index);
        }

        let (index, report) = self.builder.build(host, now);
        let index = Arc::new(index);
        self.current = Some(Arc::clone(&index));
        self.built_at = Some(now);
        self.last_report = report;
        self.rebuilds += 1;
        index
    }
}
