#![forbid(unsafe_code)]

//! Scripted navigation sessions.
//!
//! A fixture describes a page (images, optionally inside frames) and a
//! sequence of steps: key presses, key releases, waits, image loads and
//! manual scrolls. Key steps may carry an expectation checked during
//! replay.

use std::fs;
use std::path::Path;

use imgstep_index::synthetic::{DocId, ElemId, SyntheticPage};
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

fn default_viewport_height() -> f64 {
    1000.0
}

fn default_width() -> f64 {
    600.0
}

fn default_true() -> bool {
    true
}

/// A scripted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    pub name: String,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    /// Scrollable height; derived from the lowest image when absent.
    #[serde(default)]
    pub document_height: Option<f64>,
    #[serde(default)]
    pub start_offset: f64,
    #[serde(default)]
    pub frames: Vec<FrameSpec>,
    pub images: Vec<ImageSpec>,
    pub steps: Vec<Step>,
}

/// An iframe in the top-level document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameSpec {
    pub top: f64,
    #[serde(default)]
    pub cross_origin: bool,
}

/// An image. `top` is relative to its frame's document when `frame` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSpec {
    pub top: f64,
    pub height: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_true")]
    pub loaded: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub frame: Option<usize>,
}

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    Key {
        key: String,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        alt: bool,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        meta: bool,
        /// Tag name of the focused element.
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        expect: Option<Expectation>,
    },
    KeyUp {
        key: String,
    },
    Wait {
        ms: u64,
    },
    /// Finish loading an image that started out pending.
    Load {
        image: usize,
    },
    /// Scroll as the user would with the mouse wheel.
    Scroll {
        offset: f64,
    },
}

/// What a key step should produce. Absent fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Scroll offset after the key.
    #[serde(default)]
    pub offset: Option<f64>,
    /// Decision branch name.
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub stuck: Option<bool>,
    /// Whether the key was consumed.
    #[serde(default)]
    pub handled: Option<bool>,
}

/// Element handles of a built page, indexed like the fixture.
#[derive(Debug)]
pub struct BuiltPage {
    pub page: SyntheticPage,
    pub images: Vec<ElemId>,
}

impl Fixture {
    pub fn from_json_str(input: &str) -> Result<Self> {
        let fixture: Self = serde_json::from_str(input)?;
        fixture.validate()?;
        Ok(fixture)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Reject references to missing frames or images and non-finite geometry.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(HarnessError::invalid_fixture(&self.name, message));

        if !(self.viewport_height.is_finite() && self.viewport_height > 0.0) {
            return invalid(format!("viewport_height {} must be positive", self.viewport_height));
        }
        if let Some(height) = self.document_height
            && !(height.is_finite() && height >= 0.0)
        {
            return invalid(format!("document_height {height} must be non-negative"));
        }
        if !self.start_offset.is_finite() || self.start_offset < 0.0 {
            return invalid(format!("start_offset {} must be non-negative", self.start_offset));
        }
        for (i, frame) in self.frames.iter().enumerate() {
            if !frame.top.is_finite() {
                return invalid(format!("frame {i} has a non-finite top"));
            }
        }
        for (i, image) in self.images.iter().enumerate() {
            if !(image.top.is_finite() && image.height.is_finite() && image.width.is_finite()) {
                return invalid(format!("image {i} has non-finite geometry"));
            }
            if image.height < 0.0 || image.width < 0.0 {
                return invalid(format!("image {i} has a negative size"));
            }
            if let Some(frame) = image.frame
                && frame >= self.frames.len()
            {
                return invalid(format!("image {i} refers to missing frame {frame}"));
            }
        }
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Load { image } if *image >= self.images.len() => {
                    return invalid(format!("step {i} loads missing image {image}"));
                }
                Step::Scroll { offset } if !offset.is_finite() => {
                    return invalid(format!("step {i} scrolls to a non-finite offset"));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Build the synthetic page. Expects a [`validate`](Self::validate)d fixture.
    ///
    /// Images inside a cross-origin frame land in a document no frame
    /// exposes, so the scanner never sees them.
    #[must_use]
    pub fn build_page(&self) -> BuiltPage {
        let mut page = SyntheticPage::new();
        let root = page.root();

        let frame_docs: Vec<DocId> = self
            .frames
            .iter()
            .map(|frame| {
                if frame.cross_origin {
                    page.add_cross_origin_frame(root, None, frame.top);
                    page.add_orphan_document()
                } else {
                    page.add_frame(root, None, frame.top).1
                }
            })
            .collect();

        let images = self
            .images
            .iter()
            .map(|spec| {
                let document = spec.frame.map_or(root, |frame| frame_docs[frame]);
                let id = page.add_image(document, None, spec.top, spec.width, spec.height);
                let metrics = page.metrics_mut(id);
                if !spec.loaded {
                    metrics.complete = false;
                    metrics.natural_width = 0.0;
                    metrics.natural_height = 0.0;
                }
                metrics.visibility_hidden = spec.hidden;
                id
            })
            .collect();

        if let Some(height) = self.document_height {
            page.set_document_height(height);
        }

        BuiltPage { page, images }
    }
}

impl BuiltPage {
    /// Mark a pending image as loaded with its natural size restored.
    pub fn finish_load(&mut self, index: usize) {
        let Some(&id) = self.images.get(index) else {
            return;
        };
        let metrics = self.page.metrics_mut(id);
        metrics.complete = true;
        metrics.natural_width = metrics.width;
        metrics.natural_height = metrics.height;
    }
}
