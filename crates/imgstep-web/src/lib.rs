#![forbid(unsafe_code)]

//! Browser binding for imgstep.
//!
//! This crate provides [`ImageStepper`], a `wasm-bindgen`-exported struct
//! that installs the key, scroll, mutation and load listeners on a page and
//! renders stuck diagnostics as an on-page toast.
//!
//! The event plumbing lives in [`StepperCore`], which only sees plain
//! strings, flags and numbers. It runs unchanged in native tests against the
//! synthetic document host.

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use dom::DomHost;
#[cfg(target_arch = "wasm32")]
pub use wasm::ImageStepper;

pub mod registry;
pub mod stepper_core;

pub use registry::{ListenerRegistry, Registration};
pub use stepper_core::{KeyDownResult, KeyInput, ScrollBehaviorKind, ScrollRequest, StepperCore};
