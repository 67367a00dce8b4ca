#![forbid(unsafe_code)]

//! Image position index and its staleness cache.
//!
//! # Role in imgstep
//! `imgstep-index` turns a live document into a sorted list of image extents
//! in top-level document space. It reads the document only through the
//! [`DocumentHost`] capability trait, so the traversal runs unchanged against
//! a browser DOM (`imgstep-web`) or the synthetic host used in tests.
//!
//! # Primary responsibilities
//! - **Discovery**: images in the root document and every accessible nested
//!   document; inaccessible (cross-origin) frames are skipped silently.
//! - **Geometry**: absolute tops across offset-parent chains and frame
//!   boundaries.
//! - **Caching**: a freshness window plus an eager invalidation signal.
//! - **Change classification**: which DOM mutations and load events make
//!   the index stale.

pub mod cache;
pub mod host;
pub mod index;
pub mod invalidation;

#[cfg(any(test, feature = "test-helpers"))]
pub mod synthetic;

pub use cache::{CacheStats, DEFAULT_FRESHNESS, PositionCache};
pub use host::{DocumentHost, FrameAccess, ImageMetrics};
pub use index::{
    DEFAULT_MIN_IMAGE_SIDE, ImageRecord, IndexBuilder, PositionIndex, ScanReport, absolute_top,
};
pub use invalidation::{DomChange, NodeKind, StaleHandle};
