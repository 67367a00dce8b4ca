#![forbid(unsafe_code)]

//! Vertical extents in document space.

/// A vertical extent in CSS pixels, `top` inclusive and `bottom` exclusive.
///
/// Coordinates are absolute offsets from the top of the top-level document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Span {
    /// Top edge.
    pub top: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    /// Create a span from a top edge and a height.
    #[inline]
    pub fn from_height(top: f64, height: f64) -> Self {
        Self::new(top, top + height)
    }

    /// Height of the span.
    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// A span is valid when both edges are finite, the top is not negative,
    /// and the bottom lies strictly below the top.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.top.is_finite() && self.bottom.is_finite() && self.top >= 0.0 && self.bottom > self.top
    }

    /// Check whether `y` lies strictly between the edges.
    #[inline]
    pub fn strictly_contains(&self, y: f64) -> bool {
        self.top < y && self.bottom > y
    }

    /// Check whether any part of the span is visible in `other`.
    ///
    /// Touching edges do not count as overlap.
    #[inline]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.bottom > other.top && self.top < other.bottom
    }
}
