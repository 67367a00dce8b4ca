#![forbid(unsafe_code)]

//! Core: key events, focus context, geometry, and time.
//!
//! # Role in imgstep
//! `imgstep-core` is the input layer. It owns the canonical key event types
//! that a host (a browser binding, the replay harness) translates its native
//! events into, the key → command mapping, and the monotonic clock the
//! runtime reads its deadlines from.
//!
//! # How it fits in the system
//! `imgstep-index` builds the image position index, `imgstep-engine` decides
//! scroll targets from it, and `imgstep-runtime` drives both from the
//! events defined here. Nothing in this crate touches a DOM.

pub mod clock;
pub mod event;
pub mod geometry;
pub mod keybinding;

pub use clock::{Clock, DeterministicClock, SystemClock};
pub use event::{FocusContext, KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use geometry::Span;
pub use keybinding::{CycleKey, KeyMap, NavCommand};
