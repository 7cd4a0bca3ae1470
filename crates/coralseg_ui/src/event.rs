//! Input events routed through the shortcut dispatcher.
//!
//! Key presses arrive as [`KeyEvent`]s carrying an [`EventId`] that is unique per
//! physical key press. Shortcuts are matched on [`KeyCombo`], a normalized
//! key-plus-modifiers value that can be parsed from strings like `"Control+Z"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::KEY_COMBO_SEPARATOR;
use crate::error::ShortcutError;

/// Identifier of a single physical input event.
///
/// Two presses of the same key always get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
    /// Raw numeric value of the id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Hands out strictly increasing [`EventId`]s.
#[derive(Debug, Default)]
pub struct EventIdSource {
    last: u64,
}

impl EventIdSource {
    /// Create a source whose first id is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the id for the next physical event.
    pub fn next_id(&mut self) -> EventId {
        self.last += 1;
        EventId(self.last)
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keyboard keys (simplified set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character, always stored lowercase.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    Space,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// Function key F1-F12.
    F(u8),
}

impl Key {
    /// Build a character key, lowercasing it. A space is [`Key::Space`].
    pub fn char(c: char) -> Self {
        if c == ' ' {
            Key::Space
        } else {
            Key::Char(lowercase_char(c))
        }
    }

    /// Convert a DOM `KeyboardEvent.key` value into a key.
    ///
    /// Returns `None` for keys the dispatcher does not route (modifier keys on
    /// their own, dead keys, media keys...).
    pub fn from_dom_key(value: &str) -> Option<Self> {
        let mut chars = value.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Key::char(c));
        }

        match value {
            "Enter" => Some(Key::Enter),
            "Escape" | "Esc" => Some(Key::Escape),
            "Backspace" => Some(Key::Backspace),
            "Delete" | "Del" => Some(Key::Delete),
            "Tab" => Some(Key::Tab),
            "ArrowUp" => Some(Key::Up),
            "ArrowDown" => Some(Key::Down),
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            "Home" => Some(Key::Home),
            "End" => Some(Key::End),
            "PageUp" => Some(Key::PageUp),
            "PageDown" => Some(Key::PageDown),
            other => parse_function_key(other),
        }
    }

    /// Parse the lowercase name used inside key combination strings.
    fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Key::char(c));
        }

        match name {
            "enter" | "return" => Some(Key::Enter),
            "escape" | "esc" => Some(Key::Escape),
            "backspace" => Some(Key::Backspace),
            "delete" | "del" => Some(Key::Delete),
            "tab" => Some(Key::Tab),
            "space" => Some(Key::Space),
            "plus" => Some(Key::Char('+')),
            "up" | "arrowup" => Some(Key::Up),
            "down" | "arrowdown" => Some(Key::Down),
            "left" | "arrowleft" => Some(Key::Left),
            "right" | "arrowright" => Some(Key::Right),
            "home" => Some(Key::Home),
            "end" => Some(Key::End),
            "pageup" => Some(Key::PageUp),
            "pagedown" => Some(Key::PageDown),
            other => parse_function_key(other),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char('+') => f.write_str("plus"),
            Key::Char(c) => write!(f, "{c}"),
            Key::Enter => f.write_str("enter"),
            Key::Escape => f.write_str("escape"),
            Key::Backspace => f.write_str("backspace"),
            Key::Delete => f.write_str("delete"),
            Key::Tab => f.write_str("tab"),
            Key::Space => f.write_str("space"),
            Key::Up => f.write_str("up"),
            Key::Down => f.write_str("down"),
            Key::Left => f.write_str("left"),
            Key::Right => f.write_str("right"),
            Key::Home => f.write_str("home"),
            Key::End => f.write_str("end"),
            Key::PageUp => f.write_str("pageup"),
            Key::PageDown => f.write_str("pagedown"),
            Key::F(n) => write!(f, "f{n}"),
        }
    }
}

fn lowercase_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

fn parse_function_key(value: &str) -> Option<Key> {
    let digits = value.strip_prefix('F').or_else(|| value.strip_prefix('f'))?;
    match digits.parse::<u8>() {
        Ok(n @ 1..=12) => Some(Key::F(n)),
        _ => None,
    }
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyModifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Only the control key held.
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };
}

/// A key together with the modifiers that must be held.
///
/// Parsing is case-insensitive and order-insensitive, so `"Z+Control"` and
/// `"control+z"` are the same combination. The canonical text form lists the
/// modifiers alphabetically (`alt`, `control`, `meta`, `shift`) followed by the
/// key, and is what the combo serializes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: KeyModifiers,
}

impl KeyCombo {
    /// A combination without modifiers.
    pub fn key(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// A combination with explicit modifiers.
    pub fn with_modifiers(key: Key, modifiers: KeyModifiers) -> Self {
        Self { key, modifiers }
    }

    /// Parse a combination such as `"d"`, `"control+z"` or `"Shift+Alt+F2"`.
    pub fn parse(input: &str) -> Result<Self, ShortcutError> {
        let invalid = |reason: &str| ShortcutError::InvalidKeyCombo {
            combo: input.to_string(),
            reason: reason.to_string(),
        };

        let normalized = input.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(invalid("empty combination"));
        }

        let mut modifiers = KeyModifiers::NONE;
        let mut key = None;
        for part in normalized.split(KEY_COMBO_SEPARATOR).map(str::trim) {
            match part {
                "" => return Err(invalid("empty segment")),
                "control" | "ctrl" => modifiers.ctrl = true,
                "meta" | "cmd" | "command" => modifiers.meta = true,
                "shift" => modifiers.shift = true,
                "alt" | "option" => modifiers.alt = true,
                name => {
                    let parsed = Key::from_name(name)
                        .ok_or_else(|| invalid(&format!("unknown key '{name}'")))?;
                    if key.replace(parsed).is_some() {
                        return Err(invalid("more than one non-modifier key"));
                    }
                }
            }
        }

        let key = key.ok_or_else(|| invalid("no non-modifier key"))?;
        Ok(Self { key, modifiers })
    }

    /// The combination a key event represents.
    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            key: event.key,
            modifiers: event.modifiers,
        }
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.modifiers.alt, "alt"),
            (self.modifiers.ctrl, "control"),
            (self.modifiers.meta, "meta"),
            (self.modifiers.shift, "shift"),
        ];
        for (_, name) in flags.iter().filter(|(held, _)| *held) {
            write!(f, "{name}{KEY_COMBO_SEPARATOR}")?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for KeyCombo {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for KeyCombo {
    type Error = ShortcutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KeyCombo> for String {
    fn from(combo: KeyCombo) -> Self {
        combo.to_string()
    }
}

/// A single key-down event as seen by the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Unique id of the physical key press
    pub id: EventId,
    /// The pressed key
    pub key: Key,
    /// Modifiers held during the press
    pub modifiers: KeyModifiers,
    /// The event target opted out of shortcuts (e.g. a text input)
    pub suppress_shortcuts: bool,
}

impl KeyEvent {
    /// Create an event for a key press.
    pub fn new(id: EventId, key: Key, modifiers: KeyModifiers) -> Self {
        Self {
            id,
            key,
            modifiers,
            suppress_shortcuts: false,
        }
    }

    /// Mark the event as coming from a target that must not trigger shortcuts.
    pub fn from_shortcut_free_target(mut self) -> Self {
        self.suppress_shortcuts = true;
        self
    }

    /// The key combination of this event.
    pub fn combo(&self) -> KeyCombo {
        KeyCombo::from_event(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_order_and_case_insensitive() {
        let a = KeyCombo::parse("Control+Z").unwrap();
        let b = KeyCombo::parse("z+ctrl").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, KeyCombo::with_modifiers(Key::Char('z'), KeyModifiers::CTRL));
        assert_eq!(a.to_string(), "control+z");
    }

    #[test]
    fn test_parse_single_key() {
        let combo: KeyCombo = "D".parse().unwrap();
        assert_eq!(combo, KeyCombo::key(Key::Char('d')));
        assert_eq!(combo.to_string(), "d");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(KeyCombo::parse("").is_err());
        assert!(KeyCombo::parse("control+").is_err());
        assert!(KeyCombo::parse("control+shift").is_err());
        assert!(KeyCombo::parse("a+b").is_err());
        assert!(KeyCombo::parse("hyper+a").is_err());
    }

    #[test]
    fn test_canonical_modifier_order() {
        let combo = KeyCombo::parse("shift+meta+alt+control+f2").unwrap();
        assert_eq!(combo.to_string(), "alt+control+meta+shift+f2");
        assert_eq!(KeyCombo::parse(&combo.to_string()).unwrap(), combo);
    }

    #[test]
    fn test_combo_from_event() {
        let mut ids = EventIdSource::new();
        let event = KeyEvent::new(ids.next_id(), Key::char('Y'), KeyModifiers::CTRL);
        assert_eq!(event.combo(), KeyCombo::parse("control+y").unwrap());
    }

    #[test]
    fn test_from_dom_key() {
        assert_eq!(Key::from_dom_key("A"), Some(Key::Char('a')));
        assert_eq!(Key::from_dom_key(" "), Some(Key::Space));
        assert_eq!(Key::from_dom_key("Escape"), Some(Key::Escape));
        assert_eq!(Key::from_dom_key("F5"), Some(Key::F(5)));
        assert_eq!(Key::from_dom_key("F13"), None);
        assert_eq!(Key::from_dom_key("Shift"), None);
    }

    #[test]
    fn test_space_char_is_space_key() {
        assert_eq!(Key::char(' '), Key::Space);
        let mut ids = EventIdSource::new();
        let event = KeyEvent::new(ids.next_id(), Key::char(' '), KeyModifiers::NONE);
        assert_eq!(event.combo(), KeyCombo::parse("space").unwrap());
    }

    #[test]
    fn test_event_ids_increase() {
        let mut ids = EventIdSource::new();
        let first = ids.next_id();
        let second = ids.next_id();
        assert!(second > first);
        assert_eq!(first.raw(), 1);
    }

    #[test]
    fn test_combo_serde_as_string() {
        let combo = KeyCombo::parse("ctrl+y").unwrap();
        let json = serde_json::to_string(&combo).unwrap();
        assert_eq!(json, "\"control+y\"");
        let back: KeyCombo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, combo);
        assert!(serde_json::from_str::<KeyCombo>("\"control+\"").is_err());
    }
}
