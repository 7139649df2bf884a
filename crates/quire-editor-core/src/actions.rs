//! Editor actions and key input types.
//!
//! Platform-agnostic definitions for keyboard input. Hosts convert their
//! native key events into a [`KeyCombo`]; [`Keybindings`] maps combos onto
//! block-level [`EditorAction`]s.

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::platform::FormatCommand;
use crate::types::Direction;

/// Key values, modelled on the W3C `KeyboardEvent.key` names the editor
/// cares about. Everything else arrives as `Character` or `Unidentified`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    ///
    /// A single `" "` becomes [`Key::Space`], matching how hosts report it.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        let s = s.into();
        if s == " " {
            Self::Space
        } else {
            Self::Character(s)
        }
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }

    /// Parse a W3C key name (`"Enter"`, `"ArrowUp"`, `"b"`).
    pub fn from_name(name: &str) -> Self {
        match name {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" => Self::Escape,
            " " | "Space" | "Spacebar" => Self::Space,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Alt" => Self::Alt,
            "Control" => Self::Control,
            "Meta" => Self::Meta,
            "Shift" => Self::Shift,
            "" | "Unidentified" => Self::Unidentified,
            other => Self::Character(other.into()),
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META_SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: true,
    };
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn ctrl(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::CTRL)
    }

    pub fn meta(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::META)
    }

    pub fn shift(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::SHIFT)
    }

    /// Character keys are compared case-insensitively, since Shift turns
    /// `x` into `X` on most hosts.
    fn normalized(&self) -> Self {
        let key = match &self.key {
            Key::Character(s) => Key::Character(s.to_lowercase().into()),
            other => other.clone(),
        };
        Self {
            key,
            modifiers: self.modifiers,
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Bound key the editor declined to act on (soft break, Backspace in
    /// text, a space with no shortcut); the platform default applies.
    PassThrough,
}

/// Block-level editing actions a key can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    /// Enter: split the block at the caret.
    SplitBlock,
    /// Shift+Enter: soft line break inside the block, left to the host.
    SoftBreak,
    /// Backspace: merge an empty block into the previous one.
    MergeBackward,
    /// Space: try the autoformat shortcuts.
    Autoformat,
    /// Arrow keys: move focus to an adjacent block.
    Navigate(Direction),
    /// Inline formatting over the current selection.
    Format(FormatCommand),
}

/// Lookup table from key combos to actions.
#[derive(Debug, Clone)]
pub struct Keybindings {
    bindings: HashMap<KeyCombo, EditorAction>,
}

impl Default for Keybindings {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(KeyCombo::new(Key::Enter), EditorAction::SplitBlock);
        bindings.insert(KeyCombo::shift(Key::Enter), EditorAction::SoftBreak);
        bindings.insert(KeyCombo::new(Key::Backspace), EditorAction::MergeBackward);
        bindings.insert(KeyCombo::new(Key::Space), EditorAction::Autoformat);
        bindings.insert(
            KeyCombo::new(Key::ArrowUp),
            EditorAction::Navigate(Direction::Up),
        );
        bindings.insert(
            KeyCombo::new(Key::ArrowDown),
            EditorAction::Navigate(Direction::Down),
        );

        let formats = [
            ("b", Modifiers::CTRL, Modifiers::META, FormatCommand::Bold),
            ("i", Modifiers::CTRL, Modifiers::META, FormatCommand::Italic),
            ("u", Modifiers::CTRL, Modifiers::META, FormatCommand::Underline),
            (
                "x",
                Modifiers::CTRL_SHIFT,
                Modifiers::META_SHIFT,
                FormatCommand::Strikethrough,
            ),
        ];
        for (key, ctrl, meta, command) in formats {
            for modifiers in [ctrl, meta] {
                bindings.insert(
                    KeyCombo::with_modifiers(Key::character(key), modifiers),
                    EditorAction::Format(command),
                );
            }
        }

        Self { bindings }
    }
}

impl Keybindings {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, combo: KeyCombo, action: EditorAction) {
        self.bindings.insert(combo.normalized(), action);
    }

    pub fn unbind(&mut self, combo: &KeyCombo) {
        self.bindings.remove(&combo.normalized());
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<EditorAction> {
        self.bindings.get(&combo.normalized()).copied()
    }
}
