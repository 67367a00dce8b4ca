#![forbid(unsafe_code)]

//! The three decision procedures.
//!
//! Each procedure scans the sorted index once or twice and returns the first
//! branch that applies. Branch order matters and is fixed:
//!
//! **Next**
//! 1. An ordinary image whose top is visible but whose bottom is cut off,
//!    and whose top is more than the alignment threshold below the current
//!    offset: align its top.
//! 2. A large image (taller than the viewport) overlaps the view: step within
//!    it while enough remains below, otherwise jump to the next image that
//!    starts near its bottom, otherwise step.
//! 3. The first image starting at or after the bottom edge (with slack).
//! 4. Fixed step, bounded by the document.
//!
//! **Previous**
//! 1. A large image overlaps the view: near its top, jump to an earlier image
//!    that ends clearly above it, otherwise step; away from its top, step up
//!    but never past its top.
//! 2. The last image starting clearly above the current offset.
//! 3. Fixed step, bounded by zero.
//!
//! **Page up** targets one viewport up, preferring an image top inside a band
//! around that target, then one just above it.
//!
//! Image-top targets pass through the [`SnapCorrector`]; step targets do not.

use imgstep_index::ImageRecord;
use tracing::debug;

use crate::config::{NavConfig, PageUpPolicy, StepPolicy};
use crate::decision::{DecisionReason, ScrollDecision};
use crate::snap::SnapCorrector;
use crate::viewport::ViewportState;

/// Decides target scroll offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionEngine {
    step: StepPolicy,
    page_up: PageUpPolicy,
    snap: SnapCorrector,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(&NavConfig::default())
    }
}

impl DecisionEngine {
    /// Create an engine from a configuration.
    #[must_use]
    pub fn new(config: &NavConfig) -> Self {
        Self {
            step: config.step.clone(),
            page_up: config.page_up.clone(),
            snap: SnapCorrector::from_policy(&config.snap),
        }
    }

    /// The snap corrector in use.
    #[must_use]
    pub fn snap_corrector(&self) -> &SnapCorrector {
        &self.snap
    }

    /// Decide the target for "next image".
    pub fn next<E>(&self, images: &[ImageRecord<E>], viewport: &ViewportState) -> ScrollDecision {
        let decision = self.decide_next(images, viewport);
        trace_decision(&decision, viewport, images.len());
        decision
    }

    /// Decide the target for "previous image".
    pub fn previous<E>(
        &self,
        images: &[ImageRecord<E>],
        viewport: &ViewportState,
    ) -> ScrollDecision {
        let decision = self.decide_previous(images, viewport);
        trace_decision(&decision, viewport, images.len());
        decision
    }

    /// Decide the target for "page up".
    pub fn page_up<E>(
        &self,
        images: &[ImageRecord<E>],
        viewport: &ViewportState,
    ) -> ScrollDecision {
        let decision = self.decide_page_up(images, viewport);
        trace_decision(&decision, viewport, images.len());
        decision
    }

    fn decide_next<E>(&self, images: &[ImageRecord<E>], viewport: &ViewportState) -> ScrollDecision {
        let current = viewport.scroll_offset;
        let viewport_height = viewport.viewport_height;
        let bottom_edge = viewport.bottom_edge();
        let step = self.step_size(viewport_height);
        let align = self.step.align_threshold_px;

        for (index, image) in images.iter().enumerate() {
            let truncated = image.top >= current
                && image.top < bottom_edge
                && image.bottom > bottom_edge;
            if truncated && !is_large(image, viewport_height) && image.top > current + align {
                return self.snapped(
                    image.top,
                    images,
                    viewport_height,
                    DecisionReason::TruncatedAtBottom {
                        index,
                        image_top: image.top,
                        image_height: image.height(),
                        current,
                    },
                );
            }
        }

        if let Some((index, large)) = large_in_view(images, viewport) {
            let remaining_below = large.bottom - bottom_edge;
            if remaining_below > viewport_height * self.step.large_remaining_ratio {
                let target = (current + step).min(large.bottom - viewport_height);
                return ScrollDecision::unsnapped(
                    target,
                    DecisionReason::ScrollWithinLarge {
                        index,
                        current,
                        target,
                        remaining_below,
                    },
                );
            }

            let threshold = large.bottom - self.step.edge_tolerance_px;
            if let Some((next_index, next)) = images
                .iter()
                .enumerate()
                .skip(index + 1)
                .find(|(_, next)| next.top >= threshold)
            {
                return self.snapped(
                    next.top,
                    images,
                    viewport_height,
                    DecisionReason::LeaveLargeToNext {
                        index,
                        next_index,
                        next_top: next.top,
                        current,
                    },
                );
            }

            let target = (current + step).min(viewport.document_height - viewport_height);
            return ScrollDecision::unsnapped(
                target,
                DecisionReason::LeaveLargeNoNext {
                    index,
                    current,
                    target,
                },
            );
        }

        if let Some((index, image)) = images
            .iter()
            .enumerate()
            .find(|(_, image)| image.top >= bottom_edge - align)
        {
            return self.snapped(
                image.top,
                images,
                viewport_height,
                DecisionReason::NextImage {
                    index,
                    image_top: image.top,
                    current,
                },
            );
        }

        let target = (current + step).min(viewport.document_height - viewport_height);
        ScrollDecision::unsnapped(target, DecisionReason::NoImagesBelow { current, target })
    }

    fn decide_previous<E>(
        &self,
        images: &[ImageRecord<E>],
        viewport: &ViewportState,
    ) -> ScrollDecision {
        let current = viewport.scroll_offset;
        let viewport_height = viewport.viewport_height;
        let step = self.step_size(viewport_height);
        let edge = self.step.edge_tolerance_px;
        let align = self.step.align_threshold_px;

        if let Some((index, large)) = large_in_view(images, viewport) {
            let remaining_above = current - large.top;
            if remaining_above <= edge {
                let earlier = images[..index]
                    .iter()
                    .enumerate()
                    .rev()
                    .filter(|(_, prev)| prev.top < current - edge)
                    .find(|(_, prev)| prev.bottom < large.top - align);
                if let Some((previous_index, prev)) = earlier {
                    return self.snapped(
                        prev.top,
                        images,
                        viewport_height,
                        DecisionReason::AtTopOfLargeToPrevious {
                            index,
                            previous_index,
                            previous_top: prev.top,
                            image_top: large.top,
                            current,
                        },
                    );
                }

                let target = (current - step).max(0.0);
                return ScrollDecision::unsnapped(
                    target,
                    DecisionReason::AtTopOfLargeNoPrevious {
                        index,
                        current,
                        target,
                    },
                );
            }

            let target = (current - step).max(large.top);
            return ScrollDecision::unsnapped(
                target,
                DecisionReason::ScrollWithinLargeUp {
                    index,
                    current,
                    target,
                    remaining_above,
                    image_top: large.top,
                    image_bottom: large.bottom,
                },
            );
        }

        if let Some((index, image)) = images
            .iter()
            .enumerate()
            .rev()
            .find(|(_, image)| image.top < current - edge)
        {
            return self.snapped(
                image.top,
                images,
                viewport_height,
                DecisionReason::PreviousImage {
                    index,
                    image_top: image.top,
                    current,
                },
            );
        }

        let target = (current - step).max(0.0);
        ScrollDecision::unsnapped(target, DecisionReason::NoImagesAbove { current, target })
    }

    fn decide_page_up<E>(
        &self,
        images: &[ImageRecord<E>],
        viewport: &ViewportState,
    ) -> ScrollDecision {
        let current = viewport.scroll_offset;
        let viewport_height = viewport.viewport_height;
        let target = (current - viewport_height).max(0.0);
        let band_low = target - viewport_height * self.page_up.band_above_ratio;
        let band_high = target + viewport_height * self.page_up.band_below_ratio;
        let fallback_low = target - self.page_up.fallback_px;

        let best = images
            .iter()
            .rev()
            .filter(|image| image.top < current)
            .find(|image| {
                let in_band = image.top >= band_low && image.top <= band_high;
                let just_above = image.top < target && image.top >= fallback_low;
                in_band || just_above
            })
            .map_or(target, |image| image.top);

        self.snapped(
            best,
            images,
            viewport_height,
            DecisionReason::PageUp { current },
        )
    }

    fn step_size(&self, viewport_height: f64) -> f64 {
        viewport_height * self.step.step_ratio
    }

    fn snapped<E>(
        &self,
        candidate: f64,
        images: &[ImageRecord<E>],
        viewport_height: f64,
        reason: DecisionReason,
    ) -> ScrollDecision {
        let outcome = self.snap.snap(candidate, images, viewport_height);
        ScrollDecision {
            target_offset: outcome.offset,
            reason,
            snap_exhausted: outcome.exhausted,
        }
    }
}

fn is_large<E>(image: &ImageRecord<E>, viewport_height: f64) -> bool {
    image.height() > viewport_height
}

/// First image taller than the viewport that overlaps the visible extent.
fn large_in_view<'a, E>(
    images: &'a [ImageRecord<E>],
    viewport: &ViewportState,
) -> Option<(usize, &'a ImageRecord<E>)> {
    let visible = viewport.visible();
    images.iter().enumerate().find(|(_, image)| {
        is_large(image, viewport.viewport_height) && image.span().overlaps(&visible)
    })
}

fn trace_decision(decision: &ScrollDecision, viewport: &ViewportState, images: usize) {
    debug!(
        command = decision.command().label(),
        branch = decision.reason.branch(),
        current = viewport.scroll_offset,
        target = decision.target_offset,
        snap_exhausted = decision.snap_exhausted,
        images,
        "scroll decision"
    );
}
