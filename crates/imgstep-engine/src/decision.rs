#![forbid(unsafe_code)]

//! Decision results and their diagnostic text.
//!
//! The engine never branches on the rationale: [`DecisionReason`] is data
//! describing which branch fired, and its `Display` impl renders the
//! multi-line text shown in stuck diagnostics.

use std::fmt;

use imgstep_core::keybinding::NavCommand;

/// Which branch of a decision procedure produced the target.
///
/// Image indices refer to positions in the sorted index snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionReason {
    /// Next: an ordinary image is cut off at the bottom edge; align its top.
    TruncatedAtBottom {
        index: usize,
        image_top: f64,
        image_height: f64,
        current: f64,
    },
    /// Next: inside a large image with enough left below; step within it.
    ScrollWithinLarge {
        index: usize,
        current: f64,
        target: f64,
        remaining_below: f64,
    },
    /// Next: at the end of a large image; jump to the image after it.
    LeaveLargeToNext {
        index: usize,
        next_index: usize,
        next_top: f64,
        current: f64,
    },
    /// Next: at the end of a large image with nothing after it.
    LeaveLargeNoNext {
        index: usize,
        current: f64,
        target: f64,
    },
    /// Next: first image starting at or below the bottom edge.
    NextImage {
        index: usize,
        image_top: f64,
        current: f64,
    },
    /// Next: no image below; fixed step.
    NoImagesBelow { current: f64, target: f64 },
    /// Previous: at the top of a large image; jump to an earlier image.
    AtTopOfLargeToPrevious {
        index: usize,
        previous_index: usize,
        previous_top: f64,
        image_top: f64,
        current: f64,
    },
    /// Previous: at the top of a large image with no earlier image.
    AtTopOfLargeNoPrevious {
        index: usize,
        current: f64,
        target: f64,
    },
    /// Previous: inside a large image; step up within it.
    ScrollWithinLargeUp {
        index: usize,
        current: f64,
        target: f64,
        remaining_above: f64,
        image_top: f64,
        image_bottom: f64,
    },
    /// Previous: nearest image starting above the current offset.
    PreviousImage {
        index: usize,
        image_top: f64,
        current: f64,
    },
    /// Previous: no image above; fixed step.
    NoImagesAbove { current: f64, target: f64 },
    /// Page up by one viewport, aligned to a nearby image.
    PageUp { current: f64 },
}

impl DecisionReason {
    /// The command whose procedure produces this reason.
    #[must_use]
    pub const fn command(&self) -> NavCommand {
        match self {
            Self::TruncatedAtBottom { .. }
            | Self::ScrollWithinLarge { .. }
            | Self::LeaveLargeToNext { .. }
            | Self::LeaveLargeNoNext { .. }
            | Self::NextImage { .. }
            | Self::NoImagesBelow { .. } => NavCommand::Next,
            Self::AtTopOfLargeToPrevious { .. }
            | Self::AtTopOfLargeNoPrevious { .. }
            | Self::ScrollWithinLargeUp { .. }
            | Self::PreviousImage { .. }
            | Self::NoImagesAbove { .. } => NavCommand::Previous,
            Self::PageUp { .. } => NavCommand::PageUp,
        }
    }

    /// Stable snake_case branch name for logs and fixtures.
    #[must_use]
    pub const fn branch(&self) -> &'static str {
        match self {
            Self::TruncatedAtBottom { .. } => "truncated_at_bottom",
            Self::ScrollWithinLarge { .. } => "scroll_within_large",
            Self::LeaveLargeToNext { .. } => "leave_large_to_next",
            Self::LeaveLargeNoNext { .. } => "leave_large_no_next",
            Self::NextImage { .. } => "next_image",
            Self::NoImagesBelow { .. } => "no_images_below",
            Self::AtTopOfLargeToPrevious { .. } => "at_top_of_large_to_previous",
            Self::AtTopOfLargeNoPrevious { .. } => "at_top_of_large_no_previous",
            Self::ScrollWithinLargeUp { .. } => "scroll_within_large_up",
            Self::PreviousImage { .. } => "previous_image",
            Self::NoImagesAbove { .. } => "no_images_above",
            Self::PageUp { .. } => "page_up",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::TruncatedAtBottom {
                index,
                image_top,
                image_height,
                current,
            } => write!(
                f,
                "S: Truncated img[{index}] at bottom\n→ Align to top @ {image_top}px\n\
                 Current: {current}px\nImgHeight: {image_height}px (not large)"
            ),
            Self::ScrollWithinLarge {
                index,
                current,
                target,
                remaining_below,
            } => write!(
                f,
                "S: Inside large img[{index}]\n→ Scroll within image\n\
                 Current: {current}px → {target}px\nRemaining below: {remaining_below}px"
            ),
            Self::LeaveLargeToNext {
                index,
                next_index,
                next_top,
                current,
            } => write!(
                f,
                "S: At bottom of large img[{index}]\n→ Jump to next img[{next_index}] @ {next_top}px\n\
                 Current: {current}px"
            ),
            Self::LeaveLargeNoNext {
                index,
                current,
                target,
            } => write!(
                f,
                "S: At bottom of large img[{index}]\n→ No next img, scroll down\n\
                 Current: {current}px → {target}px"
            ),
            Self::NextImage {
                index,
                image_top,
                current,
            } => write!(
                f,
                "S: Normal nav\n→ Jump to next img[{index}] @ {image_top}px\nCurrent: {current}px"
            ),
            Self::NoImagesBelow { current, target } => write!(
                f,
                "S: No images below\n→ Scroll down by viewport\nCurrent: {current}px → {target}px"
            ),
            Self::AtTopOfLargeToPrevious {
                index,
                previous_index,
                previous_top,
                image_top,
                current,
            } => write!(
                f,
                "W: At top of large img[{index}]\n→ Jump to prev img[{previous_index}] @ {previous_top}px\n\
                 Current: {current}px, ImgTop: {image_top}px\n\
                 PrevImgTop: {previous_top}px ({}px above)",
                current - previous_top
            ),
            Self::AtTopOfLargeNoPrevious {
                index,
                current,
                target,
            } => write!(
                f,
                "W: At top of large img[{index}]\n→ No prev img found, scroll up by viewport\n\
                 Current: {current}px → {target}px"
            ),
            Self::ScrollWithinLargeUp {
                index,
                current,
                target,
                remaining_above,
                image_top,
                image_bottom,
            } => write!(
                f,
                "W: Inside large img[{index}]\n→ Scroll within image\n\
                 Current: {current}px → {target}px\nRemaining above: {remaining_above}px\n\
                 ImgTop: {image_top}px, ImgBottom: {image_bottom}px"
            ),
            Self::PreviousImage {
                index,
                image_top,
                current,
            } => write!(
                f,
                "W: Normal nav\n→ Jump to prev img[{index}] @ {image_top}px\n\
                 Current: {current}px ({}px below)",
                current - image_top
            ),
            Self::NoImagesAbove { current, target } => write!(
                f,
                "W: No images above\n→ Scroll up by viewport\nCurrent: {current}px → {target}px"
            ),
            Self::PageUp { current } => {
                write!(f, "Shift+W: Scroll up one viewport\nCurrent: {current}px")
            }
        }
    }
}

/// A target scroll offset and the branch that chose it.
///
/// `target_offset` is not clamped to the document; the caller clamps before
/// scrolling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollDecision {
    /// Proposed scroll offset.
    pub target_offset: f64,
    /// Branch that produced the target.
    pub reason: DecisionReason,
    /// The snap corrector hit its iteration cap on the way.
    pub snap_exhausted: bool,
}

impl ScrollDecision {
    /// Decision that did not pass through the snap corrector.
    #[must_use]
    pub const fn unsnapped(target_offset: f64, reason: DecisionReason) -> Self {
        Self {
            target_offset,
            reason,
            snap_exhausted: false,
        }
    }

    /// Command that produced this decision.
    #[must_use]
    pub const fn command(&self) -> NavCommand {
        self.reason.command()
    }

    /// Human-readable rationale.
    #[must_use]
    pub fn rationale(&self) -> String {
        self.reason.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_image_text() {
        let reason = DecisionReason::NextImage {
            index: 1,
            image_top: 1000.0,
            current: 0.0,
        };
        assert_eq!(
            reason.to_string(),
            "S: Normal nav\n→ Jump to next img[1] @ 1000px\nCurrent: 0px"
        );
        assert_eq!(reason.command(), NavCommand::Next);
    }

    #[test]
    fn previous_image_reports_distance() {
        let reason = DecisionReason::PreviousImage {
            index: 0,
            image_top: 200.0,
            current: 950.5,
        };
        assert_eq!(
            reason.to_string(),
            "W: Normal nav\n→ Jump to prev img[0] @ 200px\nCurrent: 950.5px (750.5px below)"
        );
    }

    #[test]
    fn page_up_text() {
        let decision = ScrollDecision::unsnapped(0.0, DecisionReason::PageUp { current: 1200.0 });
        assert_eq!(
            decision.rationale(),
            "Shift+W: Scroll up one viewport\nCurrent: 1200px"
        );
        assert_eq!(decision.command(), NavCommand::PageUp);
    }

    #[test]
    fn branch_names_are_distinct() {
        let reasons = [
            DecisionReason::NoImagesBelow {
                current: 0.0,
                target: 0.0,
            },
            DecisionReason::NoImagesAbove {
                current: 0.0,
                target: 0.0,
            },
            DecisionReason::PageUp { current: 0.0 },
        ];
        assert_eq!(reasons[0].branch(), "no_images_below");
        assert_eq!(reasons[1].branch(), "no_images_above");
        assert_eq!(reasons[2].branch(), "page_up");
    }
}
