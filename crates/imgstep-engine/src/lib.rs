#![forbid(unsafe_code)]

//! Scroll decision engine.
//!
//! # Role in imgstep
//! Given a position index snapshot and the current viewport, decide a single
//! target scroll offset plus a diagnostic reason. The three procedures
//! ([`DecisionEngine::next`], [`DecisionEngine::previous`],
//! [`DecisionEngine::page_up`]) are total and side-effect free; the caller
//! clamps to the document and applies the scroll.
//!
//! Every threshold lives in [`NavConfig`], which can be loaded from TOML or
//! JSON with the `config` feature.

pub mod config;
pub mod decision;
pub mod engine;
pub mod snap;
pub mod viewport;

pub use config::{NavConfig, NavConfigError};
pub use decision::{DecisionReason, ScrollDecision};
pub use engine::DecisionEngine;
pub use snap::{SnapCorrector, SnapOutcome};
pub use viewport::ViewportState;
