#![forbid(unsafe_code)]

//! Snap corrector.
//!
//! A proposed offset that lands strictly inside a small image is moved to
//! that image's top, and the scan restarts from the first image because
//! images may overlap. Each move strictly lowers the candidate, so the loop
//! terminates after at most one move per image; the iteration cap only
//! matters for degenerate stacks of overlapping images.
//!
//! "Small" means shorter than `height_ratio` of the viewport. Large images
//! are never snapped to, otherwise scrolling inside them would be impossible.

use imgstep_index::ImageRecord;
use tracing::warn;

use crate::config::SnapPolicy;

/// Result of a snap pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapOutcome {
    /// Final offset.
    pub offset: f64,
    /// Passes over the image list, including the final clean pass.
    pub iterations: u32,
    /// The iteration cap was reached before a clean pass.
    pub exhausted: bool,
}

/// Moves offsets off the middle of small images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCorrector {
    height_ratio: f64,
    max_iterations: u32,
}

impl Default for SnapCorrector {
    fn default() -> Self {
        Self::from_policy(&SnapPolicy::default())
    }
}

impl SnapCorrector {
    /// Create a corrector.
    #[must_use]
    pub const fn new(height_ratio: f64, max_iterations: u32) -> Self {
        Self {
            height_ratio,
            max_iterations,
        }
    }

    /// Create a corrector from a config section.
    #[must_use]
    pub const fn from_policy(policy: &SnapPolicy) -> Self {
        Self::new(policy.height_ratio, policy.max_iterations)
    }

    /// Iteration cap.
    #[must_use]
    pub const fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Snap `candidate` against `images` for a viewport of `viewport_height`.
    ///
    /// On cap exhaustion the last candidate is returned and a warning is
    /// logged; the caller still gets a usable offset.
    pub fn snap<E>(
        &self,
        candidate: f64,
        images: &[ImageRecord<E>],
        viewport_height: f64,
    ) -> SnapOutcome {
        let small_limit = viewport_height * self.height_ratio;
        let mut offset = candidate;
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;
            let bisected = images.iter().find(|image| {
                image.span().strictly_contains(offset) && image.height() < small_limit
            });
            match bisected {
                Some(image) => offset = image.top,
                None => {
                    return SnapOutcome {
                        offset,
                        iterations,
                        exhausted: false,
                    };
                }
            }
        }

        warn!(
            candidate,
            offset,
            max_iterations = self.max_iterations,
            images = images.len(),
            "snap iteration cap reached; returning last candidate"
        );
        SnapOutcome {
            offset,
            iterations,
            exhausted: true,
        }
    }
}
