#![forbid(unsafe_code)]

//! Scripted replay for the image stepper.
//!
//! Fixtures are JSON documents describing a synthetic page and a sequence
//! of key presses, waits and load events. [`replay`] drives them through the
//! same [`imgstep_web::StepperCore`] the browser build uses, on a
//! deterministic clock, and reports where every key landed.

pub mod cli;
pub mod error;
pub mod fixture;
pub mod replay;

pub use cli::{Cli, Commands, run, run_from_env};
pub use error::{HarnessError, Result};
pub use fixture::{Expectation, Fixture, FrameSpec, ImageSpec, Step};
pub use replay::{CacheSummary, ReplayReport, StepRecord, replay};
