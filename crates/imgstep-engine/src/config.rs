#![forbid(unsafe_code)]

//! Navigation policy as data.
//!
//! Every threshold the engine, cache, runtime and position cycler use is a
//! field of [`NavConfig`]. The values are empirical; the defaults reproduce
//! the tuned behaviour exactly, so `NavConfig::default()` is the reference.
//!
//! # Loading
//!
//! ```toml
//! # imgstep.toml
//! [step]
//! step_ratio = 0.9
//!
//! [keys]
//! next = "j"
//! previous = "k"
//! ```
//!
//! ```rust,ignore
//! let config = NavConfig::from_toml_file("imgstep.toml")?;
//! let config = NavConfig::from_json_str(json)?;
//! ```
//!
//! Sections and fields that are absent keep their defaults.

#[cfg(feature = "config")]
use std::path::Path;

use core::time::Duration;

use imgstep_core::keybinding::{DEFAULT_CYCLE_KEY, DEFAULT_NEXT_KEY, DEFAULT_PREVIOUS_KEY, KeyMap};
use imgstep_index::{DEFAULT_MIN_IMAGE_SIDE, IndexBuilder};
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level NavConfig
// ---------------------------------------------------------------------------

/// Top-level navigation configuration.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct NavConfig {
    /// Step sizes and alignment tolerances for next/previous.
    pub step: StepPolicy,
    /// Snap corrector parameters.
    pub snap: SnapPolicy,
    /// Page-up band parameters.
    pub page_up: PageUpPolicy,
    /// Index filtering and cache freshness.
    pub index: IndexPolicy,
    /// Key-handler timing and stuck detection.
    pub runtime: RuntimePolicy,
    /// Key assignments.
    pub keys: KeyPolicy,
    /// Scroll-position cycler parameters.
    pub history: HistoryPolicy,
}

impl NavConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, NavConfigError> {
        toml::from_str(s).map_err(NavConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NavConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NavConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, NavConfigError> {
        serde_json::from_str(s).map_err(NavConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, NavConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NavConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Return `self` if valid, or every violation as one error.
    pub fn validated(self) -> Result<Self, NavConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(NavConfigError::Validation(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let ratios = [
            ("step.step_ratio", self.step.step_ratio),
            ("step.large_remaining_ratio", self.step.large_remaining_ratio),
            ("snap.height_ratio", self.snap.height_ratio),
            ("page_up.band_above_ratio", self.page_up.band_above_ratio),
            ("page_up.band_below_ratio", self.page_up.band_below_ratio),
        ];
        for (name, value) in ratios {
            if !(value > 0.0 && value <= 1.0) {
                errors.push(format!("{name} must be in (0, 1], got {value}"));
            }
        }

        let pixels = [
            ("step.align_threshold_px", self.step.align_threshold_px),
            ("step.edge_tolerance_px", self.step.edge_tolerance_px),
            ("page_up.fallback_px", self.page_up.fallback_px),
            ("runtime.stuck_threshold_px", self.runtime.stuck_threshold_px),
            ("history.dedup_px", self.history.dedup_px),
        ];
        for (name, value) in pixels {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be a finite value >= 0, got {value}"));
            }
        }

        if !(self.index.min_image_side_px.is_finite() && self.index.min_image_side_px > 0.0) {
            errors.push(format!(
                "index.min_image_side_px must be > 0, got {}",
                self.index.min_image_side_px
            ));
        }

        if self.snap.max_iterations == 0 {
            errors.push("snap.max_iterations must be > 0".into());
        }

        if self.history.capacity < 2 {
            errors.push(format!(
                "history.capacity must be >= 2, got {}",
                self.history.capacity
            ));
        }

        let keys = [self.keys.next, self.keys.previous];
        if keys[0].eq_ignore_ascii_case(&keys[1]) {
            errors.push(format!(
                "keys.next and keys.previous must differ, both are {:?}",
                keys[0]
            ));
        }

        errors
    }

    /// Build the [`KeyMap`] for these key assignments.
    #[must_use]
    pub fn key_map(&self) -> KeyMap {
        KeyMap {
            next: self.keys.next,
            previous: self.keys.previous,
            cycle: self.keys.cycle,
        }
    }

    /// Build the [`IndexBuilder`] for these filtering rules.
    #[must_use]
    pub fn index_builder(&self) -> IndexBuilder {
        IndexBuilder::new(self.index.min_image_side_px)
    }

    /// Cache freshness window.
    #[must_use]
    pub fn freshness(&self) -> Duration {
        Duration::from_millis(self.index.freshness_ms)
    }

    /// Post-scroll settle delay.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.runtime.settle_ms)
    }

    /// Lifetime of a stuck diagnostic.
    #[must_use]
    pub fn stuck_toast_duration(&self) -> Duration {
        Duration::from_millis(self.runtime.stuck_toast_ms)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Step sizes and alignment tolerances.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct StepPolicy {
    /// Fixed-increment step as a fraction of the viewport. Default: 0.85.
    pub step_ratio: f64,
    /// Minimum move for aligning a truncated image, slack below the bottom
    /// edge for the next image, and required gap before a large image.
    /// Default: 10.
    pub align_threshold_px: f64,
    /// "Near the edge" tolerance around large images and for previous-image
    /// search. Default: 50.
    pub edge_tolerance_px: f64,
    /// Remaining-below fraction of the viewport that keeps scrolling inside
    /// a large image. Default: 0.1.
    pub large_remaining_ratio: f64,
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self {
            step_ratio: 0.85,
            align_threshold_px: 10.0,
            edge_tolerance_px: 50.0,
            large_remaining_ratio: 0.1,
        }
    }
}

/// Snap corrector parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SnapPolicy {
    /// Images shorter than this fraction of the viewport are snapped to.
    /// Default: 0.8.
    pub height_ratio: f64,
    /// Iteration bound. Default: 100.
    pub max_iterations: u32,
}

impl Default for SnapPolicy {
    fn default() -> Self {
        Self {
            height_ratio: 0.8,
            max_iterations: 100,
        }
    }
}

/// Page-up alignment band.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct PageUpPolicy {
    /// Band extent above the target, as a fraction of the viewport.
    /// Default: 0.1.
    pub band_above_ratio: f64,
    /// Band extent below the target, as a fraction of the viewport.
    /// Default: 0.3.
    pub band_below_ratio: f64,
    /// Acceptance window just above the target. Default: 100.
    pub fallback_px: f64,
}

impl Default for PageUpPolicy {
    fn default() -> Self {
        Self {
            band_above_ratio: 0.1,
            band_below_ratio: 0.3,
            fallback_px: 100.0,
        }
    }
}

/// Index filtering and cache freshness.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct IndexPolicy {
    /// Images whose area is below this side squared are ignored. Default: 80.
    pub min_image_side_px: f64,
    /// Cache freshness window in milliseconds. Default: 100.
    pub freshness_ms: u64,
}

impl Default for IndexPolicy {
    fn default() -> Self {
        Self {
            min_image_side_px: DEFAULT_MIN_IMAGE_SIDE,
            freshness_ms: 100,
        }
    }
}

/// Key-handler timing and stuck detection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RuntimePolicy {
    /// Delay after a scroll before the index is marked stale. Default: 150.
    pub settle_ms: u64,
    /// A move smaller than this counts as stuck. Default: 5.
    pub stuck_threshold_px: f64,
    /// Lifetime of the stuck diagnostic. Default: 5000.
    pub stuck_toast_ms: u64,
}

impl Default for RuntimePolicy {
    fn default() -> Self {
        Self {
            settle_ms: 150,
            stuck_threshold_px: 5.0,
            stuck_toast_ms: 5000,
        }
    }
}

/// Key assignments.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct KeyPolicy {
    /// Next image. Default: `s`.
    pub next: char,
    /// Previous image; Shift pages up. Default: `w`.
    pub previous: char,
    /// With Alt, cycles remembered positions. Default: `c`.
    pub cycle: char,
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self {
            next: DEFAULT_NEXT_KEY,
            previous: DEFAULT_PREVIOUS_KEY,
            cycle: DEFAULT_CYCLE_KEY,
        }
    }
}

/// Scroll-position cycler parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct HistoryPolicy {
    /// Positions closer than this replace each other. Default: 50.
    pub dedup_px: f64,
    /// Positions remembered. Default: 10.
    pub capacity: usize,
    /// Quiet time after scrolling before a position is recorded.
    /// Default: 250.
    pub record_delay_ms: u64,
    /// Presses closer than this cycle through every position; slower presses
    /// toggle between the last two. Default: 180.
    pub fast_switch_ms: u64,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            dedup_px: 50.0,
            capacity: 10,
            record_delay_ms: 250,
            fast_switch_ms: 180,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a navigation configuration.
#[derive(Debug)]
pub enum NavConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for NavConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for NavConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
