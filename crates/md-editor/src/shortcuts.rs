//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Ctrl and ⌘
//! are interchangeable. While a text field has focus only Escape is
//! handled, so typing and the field's own undo keep working.

use crate::input::Modifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    ToolSelect,
    ToolText,
    ToolRectangle,
    ToolCircle,
    ToolLine,
    ToolPen,

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Duplicate,
    SelectAll,
    /// Escape: cancel an active drag, otherwise deselect.
    Cancel,

    // ── Z-order ──
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,

    // ── Mockup ──
    ToggleDragMode,
}

/// Where keyboard focus currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Canvas,
    /// A text input, textarea or contentEditable region.
    TextInput,
}

/// Which surface receives the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutContext {
    Editor,
    Mockup,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action. Returns `None` if the combo has
    /// no binding in `context`.
    pub fn resolve(
        key: &str,
        modifiers: Modifiers,
        focus: Focus,
        context: ShortcutContext,
    ) -> Option<ShortcutAction> {
        if key == "Escape" {
            return Some(ShortcutAction::Cancel);
        }
        if focus == Focus::TextInput {
            return None;
        }
        let cmd = modifiers.command();

        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match (key, context) {
                ("z" | "Z", _) => Some(ShortcutAction::Undo),
                ("y" | "Y", _) => Some(ShortcutAction::Redo),
                ("d" | "D", ShortcutContext::Mockup) => Some(ShortcutAction::ToggleDragMode),
                ("d" | "D", ShortcutContext::Editor) => Some(ShortcutAction::Duplicate),
                ("a" | "A", ShortcutContext::Editor) => Some(ShortcutAction::SelectAll),
                ("[", ShortcutContext::Editor) => Some(ShortcutAction::SendBackward),
                ("]", ShortcutContext::Editor) => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        if modifiers.shift || modifiers.alt {
            return None;
        }

        match (key, context) {
            ("Delete" | "Backspace", _) => Some(ShortcutAction::Delete),
            ("v" | "V", ShortcutContext::Editor) => Some(ShortcutAction::ToolSelect),
            ("t" | "T", ShortcutContext::Editor) => Some(ShortcutAction::ToolText),
            ("r" | "R", ShortcutContext::Editor) => Some(ShortcutAction::ToolRectangle),
            ("o" | "O", ShortcutContext::Editor) => Some(ShortcutAction::ToolCircle),
            ("l" | "L", ShortcutContext::Editor) => Some(ShortcutAction::ToolLine),
            ("p" | "P", ShortcutContext::Editor) => Some(ShortcutAction::ToolPen),
            _ => None,
        }
    }
}
