#![forbid(unsafe_code)]

//! The document capability interface.
//!
//! [`DocumentHost`] is everything the index builder needs from a host
//! environment: which documents exist, which images and frames they contain,
//! the rendered metrics of an image, and the offset-parent chain used to
//! place an element in document space.
//!
//! Implementations must never fail. Anything the host cannot read (a
//! cross-origin frame, a detached element) is reported as absent.

use std::fmt;

/// Result of trying to enter a frame's content document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameAccess<D> {
    /// The frame's document is readable (same origin, loaded).
    Accessible(D),
    /// The frame's document cannot be read (cross origin, or not loaded).
    Inaccessible,
}

/// Rendered state of an image element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMetrics {
    /// Rendered width in CSS pixels.
    pub width: f64,
    /// Rendered height in CSS pixels.
    pub height: f64,
    /// Intrinsic width of the decoded image.
    pub natural_width: f64,
    /// Intrinsic height of the decoded image.
    pub natural_height: f64,
    /// Whether the host finished loading the image.
    pub complete: bool,
    /// Computed `display: none`.
    pub display_none: bool,
    /// Computed `visibility: hidden`.
    pub visibility_hidden: bool,
}

impl ImageMetrics {
    /// A loaded, visible image whose natural size equals its rendered size.
    #[must_use]
    pub const fn loaded(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            natural_width: width,
            natural_height: height,
            complete: true,
            display_none: false,
            visibility_hidden: false,
        }
    }

    /// Rendered area in square pixels.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Loaded and decoded to a non-empty bitmap.
    #[inline]
    #[must_use]
    pub fn is_laid_out(&self) -> bool {
        self.complete && self.natural_height > 0.0
    }

    /// Neither `display: none` nor `visibility: hidden`.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.display_none && !self.visibility_hidden
    }
}

/// Read access to a host document tree.
pub trait DocumentHost {
    /// Handle to an element. Cheap to clone; compared by identity.
    type Element: Clone + PartialEq + fmt::Debug;
    /// Handle to a document. Cheap to clone; compared by identity.
    type Document: Clone + PartialEq + fmt::Debug;

    /// The top-level document all coordinates are expressed in.
    fn root_document(&self) -> Self::Document;

    /// Image elements of `document`, in document order.
    fn images(&self, document: &Self::Document) -> Vec<Self::Element>;

    /// Frame elements (`iframe`) of `document`, in document order.
    fn frames(&self, document: &Self::Document) -> Vec<Self::Element>;

    /// Enter a frame element's content document.
    fn frame_document(&self, frame: &Self::Element) -> FrameAccess<Self::Document>;

    /// Rendered metrics of an image element.
    fn image_metrics(&self, image: &Self::Element) -> ImageMetrics;

    /// The element's `offsetTop` relative to its offset parent.
    fn offset_top(&self, element: &Self::Element) -> f64;

    /// The element's offset parent, `None` at the root of its document.
    fn offset_parent(&self, element: &Self::Element) -> Option<Self::Element>;

    /// The document that owns `element`.
    fn owner_document(&self, element: &Self::Element) -> Self::Document;

    /// The frame element, in some ancestor document, whose content document
    /// is `document`.
    ///
    /// The default walks every accessible frame reachable from the root.
    fn hosting_frame(&self, document: &Self::Document) -> Option<Self::Element> {
        let mut pending = vec![self.root_document()];
        let mut visited: Vec<Self::Document> = Vec::new();
        while let Some(current) = pending.pop() {
            if visited.contains(&current) {
                continue;
            }
            for frame in self.frames(&current) {
                if let FrameAccess::Accessible(inner) = self.frame_document(&frame) {
                    if &inner == document {
                        return Some(frame);
                    }
                    pending.push(inner);
                }
            }
            visited.push(current);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaded_metrics_are_laid_out_and_visible() {
        let metrics = ImageMetrics::loaded(400.0, 300.0);
        assert!(metrics.is_laid_out());
        assert!(metrics.is_visible());
        assert_eq!(metrics.area(), 120_000.0);
    }

    #[test]
    fn incomplete_or_empty_images_are_not_laid_out() {
        let mut metrics = ImageMetrics::loaded(400.0, 300.0);
        metrics.complete = false;
        assert!(!metrics.is_laid_out());

        let mut metrics = ImageMetrics::loaded(400.0, 300.0);
        metrics.natural_height = 0.0;
        assert!(!metrics.is_laid_out());
    }

    #[test]
    fn hidden_images_are_not_visible() {
        let mut metrics = ImageMetrics::loaded(400.0, 300.0);
        metrics.display_none = true;
        assert!(!metrics.is_visible());

        let mut metrics = ImageMetrics::loaded(400.0, 300.0);
        metrics.visibility_hidden = true;
        assert!(!metrics.is_visible());
    }
}
