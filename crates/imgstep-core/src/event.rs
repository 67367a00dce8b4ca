#![forbid(unsafe_code)]

//! Canonical key event types.
//!
//! Hosts translate their native keyboard events into [`KeyEvent`] values
//! before handing them to the runtime. All events derive `Clone`,
//! `PartialEq`, and `Eq` for use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - `KeyEventKind` defaults to `Press` when the host does not report it
//! - `Modifiers` use bitflags for easy combination
//! - Character keys keep the case the host reported (`'W'` with Shift held)

use bitflags::bitflags;

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key, ignoring ASCII case.
    #[must_use]
    pub fn is_char_ignore_case(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch.eq_ignore_ascii_case(&c))
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt modifier is held.
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check if Super/Meta/Cmd modifier is held.
    #[must_use]
    pub const fn super_key(&self) -> bool {
        self.modifiers.contains(Modifiers::SUPER)
    }

    /// Build an event from a DOM `KeyboardEvent.key` string and modifier flags.
    ///
    /// Unknown named keys map to [`KeyCode::Other`].
    #[must_use]
    pub fn from_dom_key(key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> Self {
        let mut modifiers = Modifiers::NONE;
        modifiers.set(Modifiers::SHIFT, shift);
        modifiers.set(Modifiers::CTRL, ctrl);
        modifiers.set(Modifiers::ALT, alt);
        modifiers.set(Modifiers::SUPER, meta);
        Self::new(KeyCode::from_dom_key(key)).with_modifiers(modifiers)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Tab key.
    Tab,

    /// Page Up key.
    PageUp,

    /// Page Down key.
    PageDown,

    /// The Shift key itself.
    Shift,

    /// The Control key itself.
    Control,

    /// The Alt/Option key itself.
    Alt,

    /// The Meta/Super/Command key itself.
    Meta,

    /// Any other named key the runtime does not care about.
    Other,
}

impl KeyCode {
    /// Map a DOM `KeyboardEvent.key` value.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        let mut chars = key.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Self::Char(ch);
        }
        match key {
            "Enter" => Self::Enter,
            "Escape" => Self::Escape,
            "Tab" => Self::Tab,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Shift" => Self::Shift,
            "Control" => Self::Control,
            "Alt" | "AltGraph" => Self::Alt,
            "Meta" | "OS" => Self::Meta,
            _ => Self::Other,
        }
    }
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Where keyboard focus sits when a key event arrives.
///
/// Navigation keys are plain letters, so they must never fire while the user
/// is typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FocusContext {
    /// Focus is on the page itself or a non-editable element.
    #[default]
    Document,
    /// Focus is inside an `input`, `select` or `textarea`-like control.
    TextInput,
    /// Focus is inside a `contenteditable="true"` region.
    ContentEditable,
}

impl FocusContext {
    /// Classify the event target from its tag name and `contenteditable`
    /// attribute.
    ///
    /// Tag names are matched case-insensitively and by substring, so custom
    /// elements such as `ui-textarea` count as text input.
    #[must_use]
    pub fn from_target(tag_name: Option<&str>, content_editable: Option<&str>) -> Self {
        if let Some(tag) = tag_name {
            let tag = tag.to_ascii_lowercase();
            if ["input", "select", "textarea"]
                .iter()
                .any(|needle| tag.contains(needle))
            {
                return Self::TextInput;
            }
        }
        if content_editable == Some("true") {
            return Self::ContentEditable;
        }
        Self::Document
    }

    /// Whether plain-letter shortcuts may act in this context.
    #[must_use]
    pub const fn accepts_shortcuts(self) -> bool {
        matches!(self, Self::Document)
    }
}
