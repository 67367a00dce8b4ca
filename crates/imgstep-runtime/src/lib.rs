#![forbid(unsafe_code)]

//! Event-driven controllers for imgstep.
//!
//! # Role in imgstep
//! `imgstep-runtime` is the layer a host binds to its event listeners. It
//! holds all mutable state (position cache, stuck counter, pending timers,
//! remembered positions) and turns key, scroll and timer events into scroll
//! requests and toast updates. It never touches a DOM itself: documents are
//! read through [`imgstep_index::DocumentHost`] and time comes from an
//! injected [`imgstep_core::Clock`].
//!
//! # Controllers
//! - [`Navigator`]: `s` / `w` / `Shift+w` image navigation.
//! - [`PositionCycler`]: `Alt+c` cycling through recent scroll positions.
//!
//! Both are single-owner; a host that shares them across threads wraps them
//! in a mutex. The [`imgstep_index::StaleHandle`] handed out for mutation
//! callbacks is already thread-safe.

pub mod cycler;
pub mod diagnostics;
pub mod navigator;

pub use cycler::{CycleOutcome, PositionCycler};
pub use diagnostics::{DiagnosticAction, DiagnosticQueue, DiagnosticStats, Toast, ToastId};
pub use navigator::{KeyOutcome, NavOutcome, Navigator, NavigatorStats};
