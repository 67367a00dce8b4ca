#![forbid(unsafe_code)]

//! Viewport state read at each key event.

use imgstep_core::geometry::Span;

/// Scroll position and sizes of the top-level viewport, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Current vertical scroll offset.
    pub scroll_offset: f64,
    /// Height of the visible area.
    pub viewport_height: f64,
    /// Total scrollable height of the document.
    pub document_height: f64,
}

impl ViewportState {
    /// Create a viewport state.
    #[must_use]
    pub const fn new(scroll_offset: f64, viewport_height: f64, document_height: f64) -> Self {
        Self {
            scroll_offset,
            viewport_height,
            document_height,
        }
    }

    /// Build from the two scroll offsets a browser may report.
    ///
    /// The document element and the body disagree in quirks mode; the
    /// larger of the two is the real offset.
    #[must_use]
    pub fn from_scroll_tops(
        document_scroll_top: f64,
        body_scroll_top: f64,
        viewport_height: f64,
        document_height: f64,
    ) -> Self {
        Self::new(
            document_scroll_top.max(body_scroll_top),
            viewport_height,
            document_height,
        )
    }

    /// Offset of the viewport's bottom edge.
    #[inline]
    #[must_use]
    pub fn bottom_edge(&self) -> f64 {
        self.scroll_offset + self.viewport_height
    }

    /// The visible extent.
    #[inline]
    #[must_use]
    pub fn visible(&self) -> Span {
        Span::new(self.scroll_offset, self.bottom_edge())
    }

    /// Largest reachable scroll offset.
    #[inline]
    #[must_use]
    pub fn max_scroll_offset(&self) -> f64 {
        (self.document_height - self.viewport_height).max(0.0)
    }

    /// Clamp `target` to `[0, document_height - viewport_height]`.
    #[must_use]
    pub fn clamp(&self, target: f64) -> f64 {
        target.min(self.max_scroll_offset()).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn larger_scroll_top_wins() {
        let viewport = ViewportState::from_scroll_tops(0.0, 640.0, 900.0, 5000.0);
        assert_eq!(viewport.scroll_offset, 640.0);
        assert_eq!(viewport.bottom_edge(), 1540.0);
    }

    #[test]
    fn clamp_to_document() {
        let viewport = ViewportState::new(0.0, 1000.0, 4000.0);
        assert_eq!(viewport.clamp(-20.0), 0.0);
        assert_eq!(viewport.clamp(2500.0), 2500.0);
        assert_eq!(viewport.clamp(3500.0), 3000.0);
    }

    #[test]
    fn short_document_clamps_to_zero() {
        let viewport = ViewportState::new(0.0, 1000.0, 600.0);
        assert_eq!(viewport.max_scroll_offset(), 0.0);
        assert_eq!(viewport.clamp(850.0), 0.0);
    }
}
