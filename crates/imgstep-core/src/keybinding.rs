#![forbid(unsafe_code)]

//! Key → command mapping.
//!
//! Two independent controllers consume keys:
//!
//! - **Image navigation** reacts to plain letters: `s` advances, `w` retreats,
//!   `Shift+w` pages up. Letters are compared case-insensitively because
//!   browsers report `"W"` while Shift is held.
//! - **Position cycling** reacts to `Alt+c` presses and ends when `Alt` is
//!   released.
//!
//! # Filtering
//!
//! Image navigation ignores a key when any of these hold:
//! - the event is a release,
//! - Ctrl, Alt or Super is held (Shift alone is allowed),
//! - focus is in a text-input-like control or a content-editable region.
//!
//! # Example
//!
//! ```
//! use imgstep_core::event::{FocusContext, KeyCode, KeyEvent, Modifiers};
//! use imgstep_core::keybinding::{KeyMap, NavCommand};
//!
//! let keymap = KeyMap::default();
//! let shift_w = KeyEvent::new(KeyCode::Char('W')).with_modifiers(Modifiers::SHIFT);
//! assert_eq!(
//!     keymap.resolve(&shift_w, FocusContext::Document),
//!     Some(NavCommand::PageUp)
//! );
//! assert_eq!(keymap.resolve(&shift_w, FocusContext::TextInput), None);
//! ```

use crate::event::{FocusContext, KeyCode, KeyEvent, KeyEventKind, Modifiers};

/// Default key for advancing to the next image.
pub const DEFAULT_NEXT_KEY: char = 's';

/// Default key for retreating to the previous image (Shift pages up).
pub const DEFAULT_PREVIOUS_KEY: char = 'w';

/// Default key that, with Alt held, cycles remembered scroll positions.
pub const DEFAULT_CYCLE_KEY: char = 'c';

/// High-level image navigation commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavCommand {
    /// Advance to the next image.
    Next,
    /// Retreat to the previous image.
    Previous,
    /// Scroll up one viewport, aligned to a nearby image.
    PageUp,
}

impl NavCommand {
    /// Short label for logs and diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
            Self::PageUp => "page_up",
        }
    }
}

/// Position-cycling key transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleKey {
    /// `Alt+c` pressed: move to the next remembered position.
    Advance,
    /// `Alt` released: the current cycle ends.
    Release,
}

/// Configurable key assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    /// Key that advances to the next image.
    pub next: char,
    /// Key that retreats to the previous image; with Shift, pages up.
    pub previous: char,
    /// Key that cycles remembered positions while Alt is held.
    pub cycle: char,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            next: DEFAULT_NEXT_KEY,
            previous: DEFAULT_PREVIOUS_KEY,
            cycle: DEFAULT_CYCLE_KEY,
        }
    }
}

impl KeyMap {
    /// Resolve an image navigation command.
    ///
    /// Returns `None` when the key is filtered out or unbound, in which case
    /// the host must let the event through untouched.
    #[must_use]
    pub fn resolve(&self, event: &KeyEvent, focus: FocusContext) -> Option<NavCommand> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        if event
            .modifiers
            .intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::SUPER)
        {
            return None;
        }
        if !focus.accepts_shortcuts() {
            return None;
        }

        let shift = event.shift();
        if event.is_char_ignore_case(self.next) && !shift {
            Some(NavCommand::Next)
        } else if event.is_char_ignore_case(self.previous) {
            Some(if shift {
                NavCommand::PageUp
            } else {
                NavCommand::Previous
            })
        } else {
            None
        }
    }

    /// Resolve a position-cycling transition.
    #[must_use]
    pub fn resolve_cycle(&self, event: &KeyEvent) -> Option<CycleKey> {
        match event.kind {
            KeyEventKind::Release if event.code == KeyCode::Alt => Some(CycleKey::Release),
            KeyEventKind::Release => None,
            KeyEventKind::Press | KeyEventKind::Repeat => {
                (event.alt() && event.code == KeyCode::Char(self.cycle))
                    .then_some(CycleKey::Advance)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch))
    }

    #[test]
    fn plain_letters_map_to_commands() {
        let keymap = KeyMap::default();
        assert_eq!(
            keymap.resolve(&key('s'), FocusContext::Document),
            Some(NavCommand::Next)
        );
        assert_eq!(
            keymap.resolve(&key('w'), FocusContext::Document),
            Some(NavCommand::Previous)
        );
        assert_eq!(keymap.resolve(&key('x'), FocusContext::Document), None);
    }

    #[test]
    fn shift_w_pages_up_but_shift_s_is_unbound() {
        let keymap = KeyMap::default();
        let shift_w = key('W').with_modifiers(Modifiers::SHIFT);
        let shift_s = key('S').with_modifiers(Modifiers::SHIFT);
        assert_eq!(
            keymap.resolve(&shift_w, FocusContext::Document),
            Some(NavCommand::PageUp)
        );
        assert_eq!(keymap.resolve(&shift_s, FocusContext::Document), None);
    }

    #[test]
    fn ctrl_alt_super_are_ignored() {
        let keymap = KeyMap::default();
        for modifiers in [Modifiers::CTRL, Modifiers::ALT, Modifiers::SUPER] {
            let event = key('s').with_modifiers(modifiers);
            assert_eq!(keymap.resolve(&event, FocusContext::Document), None);
        }
    }

    #[test]
    fn editable_focus_is_ignored() {
        let keymap = KeyMap::default();
        assert_eq!(keymap.resolve(&key('s'), FocusContext::TextInput), None);
        assert_eq!(
            keymap.resolve(&key('w'), FocusContext::ContentEditable),
            None
        );
    }

    #[test]
    fn release_is_ignored_but_repeat_is_not() {
        let keymap = KeyMap::default();
        let release = key('s').with_kind(KeyEventKind::Release);
        let repeat = key('s').with_kind(KeyEventKind::Repeat);
        assert_eq!(keymap.resolve(&release, FocusContext::Document), None);
        assert_eq!(
            keymap.resolve(&repeat, FocusContext::Document),
            Some(NavCommand::Next)
        );
    }

    #[test]
    fn custom_bindings() {
        let keymap = KeyMap {
            next: 'j',
            previous: 'k',
            ..KeyMap::default()
        };
        assert_eq!(
            keymap.resolve(&key('j'), FocusContext::Document),
            Some(NavCommand::Next)
        );
        assert_eq!(keymap.resolve(&key('s'), FocusContext::Document), None);
    }

    #[test]
    fn cycle_transitions() {
        let keymap = KeyMap::default();
        let alt_c = key('c').with_modifiers(Modifiers::ALT);
        assert_eq!(keymap.resolve_cycle(&alt_c), Some(CycleKey::Advance));
        assert_eq!(keymap.resolve_cycle(&key('c')), None);

        let alt_up = KeyEvent::new(KeyCode::Alt).with_kind(KeyEventKind::Release);
        assert_eq!(keymap.resolve_cycle(&alt_up), Some(CycleKey::Release));

        let c_up = key('c').with_kind(KeyEventKind::Release);
        assert_eq!(keymap.resolve_cycle(&c_up), None);
    }
}
