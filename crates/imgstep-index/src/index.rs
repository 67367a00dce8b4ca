#![forbid(unsafe_code)]

//! Position index construction.
//!
//! [`IndexBuilder::build`] scans the root document and every accessible
//! nested document for qualifying images and returns them sorted by their
//! absolute top edge.
//!
//! # Invariants
//!
//! 1. Records are sorted ascending by `top`; ties keep discovery order.
//! 2. Every record satisfies `bottom > top` and `top >= 0`.
//! 3. Only laid-out, visible images whose rendered area reaches
//!    `min_image_side²` are included.
//! 4. `order_index` is the image's position among *all* discovered images,
//!    qualifying or not, and is stable only within one scan.
//!
//! # Failure Modes
//!
//! None. Unreadable frames are skipped, images with unusable geometry are
//! excluded, and the counts are reported in [`ScanReport`].

use core::time::Duration;

use imgstep_core::geometry::Span;
use tracing::{debug, trace, warn};

use crate::host::{DocumentHost, FrameAccess};

/// Images smaller than this on a side (by area) are treated as icons.
pub const DEFAULT_MIN_IMAGE_SIDE: f64 = 80.0;

/// Upper bound on offset-parent hops before a chain is declared broken.
const MAX_OFFSET_CHAIN: usize = 4096;

/// One qualifying image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord<E> {
    /// Position among all images discovered in the scan.
    pub order_index: usize,
    /// Absolute top edge in top-level document space.
    pub top: f64,
    /// `top` plus the rendered height.
    pub bottom: f64,
    /// The underlying element. Valid only for the scan's cache window.
    pub element: E,
}

impl<E> ImageRecord<E> {
    /// Rendered height.
    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Vertical extent.
    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.top, self.bottom)
    }
}

impl ImageRecord<()> {
    /// A record with no element, for index snapshots built from plain spans.
    #[must_use]
    pub fn detached(order_index: usize, top: f64, bottom: f64) -> Self {
        Self {
            order_index,
            top,
            bottom,
            element: (),
        }
    }
}

/// Sorted, immutable list of image records plus its construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionIndex<E> {
    records: Vec<ImageRecord<E>>,
    built_at: Duration,
}

impl<E> PositionIndex<E> {
    /// Build an index from arbitrary records, sorting them by `top`.
    ///
    /// Records violating `bottom > top` are dropped.
    #[must_use]
    pub fn from_records(mut records: Vec<ImageRecord<E>>, built_at: Duration) -> Self {
        records.retain(|record| record.span().is_valid());
        records.sort_by(|a, b| a.top.total_cmp(&b.top));
        Self { records, built_at }
    }

    /// An index with no images.
    #[must_use]
    pub fn empty(built_at: Duration) -> Self {
        Self {
            records: Vec::new(),
            built_at,
        }
    }

    /// The sorted records.
    #[inline]
    pub fn records(&self) -> &[ImageRecord<E>] {
        &self.records
    }

    /// Monotonic time at which the scan ran.
    #[inline]
    pub fn built_at(&self) -> Duration {
        self.built_at
    }

    /// Number of images.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the scan found no qualifying images.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PositionIndex<()> {
    /// Build a detached index from `(top, bottom)` pairs.
    #[must_use]
    pub fn from_spans(spans: &[(f64, f64)]) -> Self {
        let records = spans
            .iter()
            .enumerate()
            .map(|(i, &(top, bottom))| ImageRecord::detached(i, top, bottom))
            .collect();
        Self::from_records(records, Duration::ZERO)
    }
}

/// What a scan saw, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Documents scanned, the root included.
    pub documents: usize,
    /// Frames whose document could not be read.
    pub inaccessible_frames: usize,
    /// Image elements seen across all documents.
    pub discovered: usize,
    /// Excluded for rendered area below the threshold.
    pub too_small: usize,
    /// Excluded because loading had not finished or the bitmap is empty.
    pub not_loaded: usize,
    /// Excluded for `display: none` or `visibility: hidden`.
    pub hidden: usize,
    /// Excluded for NaN, negative or empty geometry.
    pub bad_geometry: usize,
    /// Records in the resulting index.
    pub indexed: usize,
}

/// Scans a host into a [`PositionIndex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexBuilder {
    min_image_side: f64,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_IMAGE_SIDE)
    }
}

impl IndexBuilder {
    /// Builder excluding images whose area is below `min_image_side²`.
    #[must_use]
    pub const fn new(min_image_side: f64) -> Self {
        Self { min_image_side }
    }

    /// Minimum rendered area an image needs to be indexed.
    #[inline]
    pub fn min_area(&self) -> f64 {
        self.min_image_side * self.min_image_side
    }

    /// Scan `host` and build a fresh index stamped with `now`.
    pub fn build<H: DocumentHost>(
        &self,
        host: &H,
        now: Duration,
    ) -> (PositionIndex<H::Element>, ScanReport) {
        let mut report = ScanReport::default();
        let documents = collect_documents(host, &mut report);
        let min_area = self.min_area();

        let mut records = Vec::new();
        let mut order_index = 0usize;
        for document in &documents {
            for image in host.images(document) {
                let index = order_index;
                order_index += 1;
                report.discovered += 1;

                let metrics = host.image_metrics(&image);
                if metrics.area() < min_area {
                    report.too_small += 1;
                    continue;
                }
                if !metrics.is_laid_out() {
                    report.not_loaded += 1;
                    continue;
                }
                if !metrics.is_visible() {
                    report.hidden += 1;
                    continue;
                }

                let top = absolute_top(host, &image);
                let span = Span::from_height(top, metrics.height);
                if !span.is_valid() {
                    trace!(order_index = index, top, height = metrics.height, "image excluded: bad geometry");
                    report.bad_geometry += 1;
                    continue;
                }

                records.push(ImageRecord {
                    order_index: index,
                    top: span.top,
                    bottom: span.bottom,
                    element: image,
                });
            }
        }

        // Stable: equal tops keep discovery order.
        records.sort_by(|a, b| a.top.total_cmp(&b.top));
        report.indexed = records.len();

        debug!(
            documents = report.documents,
            discovered = report.discovered,
            indexed = report.indexed,
            inaccessible_frames = report.inaccessible_frames,
            "position index rebuilt"
        );

        (PositionIndex { records, built_at: now }, report)
    }
}

/// The root document followed by every accessible nested document,
/// breadth first.
fn collect_documents<H: DocumentHost>(host: &H, report: &mut ScanReport) -> Vec<H::Document> {
    let mut documents = vec![host.root_document()];
    let mut cursor = 0;
    while cursor < documents.len() {
        let frames = host.frames(&documents[cursor]);
        for frame in frames {
            match host.frame_document(&frame) {
                FrameAccess::Accessible(inner) => {
                    if !documents.contains(&inner) {
                        documents.push(inner);
                    }
                }
                FrameAccess::Inaccessible => {
                    trace!(?frame, "skipping inaccessible frame");
                    report.inaccessible_frames += 1;
                }
            }
        }
        cursor += 1;
    }
    report.documents = documents.len();
    documents
}

/// Absolute top of `element` in top-level document space, rounded to whole
/// pixels.
///
/// Walks the offset-parent chain. When the chain ends at the root of a nested
/// document, the walk continues from the frame element hosting that document,
/// so offsets accumulate across frame boundaries. If the hosting frame cannot
/// be found the walk stops with the offset gathered so far.
///
/// Returns `NaN` when the host reports a non-finite offset or the chain does
/// not terminate.
pub fn absolute_top<H: DocumentHost>(host: &H, element: &H::Element) -> f64 {
    let root = host.root_document();
    let mut top = 0.0;
    let mut current = element.clone();

    for _ in 0..MAX_OFFSET_CHAIN {
        top += host.offset_top(&current);

        if let Some(parent) = host.offset_parent(&current) {
            current = parent;
            continue;
        }

        let document = host.owner_document(&current);
        if document == root {
            return top.round();
        }
        match host.hosting_frame(&document) {
            Some(frame) => current = frame,
            None => return top.round(),
        }
    }

    warn!(?element, "offset chain did not terminate");
    f64::NAN
}
