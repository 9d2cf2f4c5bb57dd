//! Keystroke filter for the wizard's numeric inputs.
//!
//! Only a typing affordance: whatever gets through is still normalized by
//! the controller, so pasted or otherwise injected text is safe.

/// A key as reported by the platform's keyboard event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Character(String),
    Backspace,
    Delete,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Tab,
    Escape,
    Enter,
    Home,
    End,
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    #[must_use]
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Backspace" => Key::Backspace,
            "Delete" => Key::Delete,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "Tab" => Key::Tab,
            "Escape" => Key::Escape,
            "Enter" => Key::Enter,
            "Home" => Key::Home,
            "End" => Key::End,
            other if other.chars().count() == 1 => Key::Character(other.to_owned()),
            other => Key::Other(other.to_owned()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };
}

/// Whether a keystroke may reach a numeric field.
///
/// Digits, navigation and editing keys pass, as does anything combined with
/// ctrl or meta (copy, paste, select all).
#[must_use]
pub fn accepts_numeric_key(key: &Key, modifiers: Modifiers) -> bool {
    if modifiers.ctrl || modifiers.meta {
        return true;
    }
    match key {
        Key::Character(value) => {
            let mut chars = value.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_digit())
        }
        Key::Backspace
        | Key::Delete
        | Key::ArrowLeft
        | Key::ArrowRight
        | Key::ArrowUp
        | Key::ArrowDown
        | Key::Tab
        | Key::Escape
        | Key::Enter
        | Key::Home
        | Key::End => true,
        Key::Other(_) => false,
    }
}
