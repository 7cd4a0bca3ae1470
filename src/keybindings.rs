//! Customizable keyboard shortcuts for the annotation editor.
//!
//! Each binding maps a key combination, within one interaction mode, to an
//! editor action. The same combination can mean different things in different
//! modes (`w` enters mask creation in selection mode and leaves it again in
//! creation mode).

use coralseg_ui::KeyCombo;
use serde::{Deserialize, Serialize};

use crate::mode::InteractionState;

/// Editor actions that can be triggered by a shortcut or a toolbar button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
    /// Restore the previous annotation snapshot
    Undo,
    /// Re-apply the last undone snapshot
    Redo,
    /// Delete the selected masks
    RemoveSelected,
    /// Drop the current mask selection
    ClearSelection,
    /// Switch to mask creation mode
    EnterMaskCreation,
    /// Leave mask creation mode, discarding prompts
    ExitMaskCreation,
    /// Remove the most recent prompt point
    UndoPrompt,
    /// Remove every prompt point
    ResetPrompts,
    /// Send the prompt points to the backend for a mask
    ConfirmPrompt,
    /// Open the next image of the project
    NextImage,
    /// Open the previous image of the project
    PrevImage,
    /// Show or hide the category selector
    ToggleCategorySelector,
}

impl ShortcutAction {
    /// Get a human-readable description of this action
    pub fn description(&self) -> &'static str {
        match self {
            ShortcutAction::Undo => "Undo",
            ShortcutAction::Redo => "Redo",
            ShortcutAction::RemoveSelected => "Delete selected masks",
            ShortcutAction::ClearSelection => "Clear selection",
            ShortcutAction::EnterMaskCreation => "Add mask",
            ShortcutAction::ExitMaskCreation => "Back to edit mode",
            ShortcutAction::UndoPrompt => "Undo prompt",
            ShortcutAction::ResetPrompts => "Reset prompts",
            ShortcutAction::ConfirmPrompt => "Confirm prompt",
            ShortcutAction::NextImage => "Next image",
            ShortcutAction::PrevImage => "Previous image",
            ShortcutAction::ToggleCategorySelector => "Toggle category selector",
        }
    }
}

/// One shortcut: `combo` pressed in `state` triggers `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    pub state: InteractionState,
    pub combo: KeyCombo,
    pub action: ShortcutAction,
}

impl ShortcutBinding {
    pub fn new(state: InteractionState, combo: KeyCombo, action: ShortcutAction) -> Self {
        Self {
            state,
            combo,
            action,
        }
    }
}

/// Keybinding configuration for the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    bindings: Vec<ShortcutBinding>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
        }
    }
}

/// The editor's built-in shortcuts.
pub fn default_bindings() -> Vec<ShortcutBinding> {
    use coralseg_ui::{Key, KeyModifiers};
    use InteractionState::{MaskCreation, MaskSelection};
    use ShortcutAction::*;

    let ctrl = |c| KeyCombo::with_modifiers(Key::Char(c), KeyModifiers::CTRL);
    let plain = |c| KeyCombo::key(Key::Char(c));

    vec![
        // Selection mode
        ShortcutBinding::new(MaskSelection, ctrl('z'), Undo),
        ShortcutBinding::new(MaskSelection, ctrl('y'), Redo),
        ShortcutBinding::new(MaskSelection, plain('r'), RemoveSelected),
        ShortcutBinding::new(MaskSelection, KeyCombo::key(Key::Escape), ClearSelection),
        ShortcutBinding::new(MaskSelection, plain('w'), EnterMaskCreation),
        ShortcutBinding::new(MaskSelection, plain('d'), NextImage),
        ShortcutBinding::new(MaskSelection, plain('a'), PrevImage),
        ShortcutBinding::new(MaskSelection, plain('c'), ToggleCategorySelector),
        // Creation mode
        ShortcutBinding::new(MaskCreation, ctrl('z'), UndoPrompt),
        ShortcutBinding::new(MaskCreation, ctrl('y'), Redo),
        ShortcutBinding::new(MaskCreation, plain('r'), ResetPrompts),
        ShortcutBinding::new(MaskCreation, plain('w'), ExitMaskCreation),
        ShortcutBinding::new(MaskCreation, KeyCombo::key(Key::Space), ConfirmPrompt),
        ShortcutBinding::new(MaskCreation, plain('d'), NextImage),
        ShortcutBinding::new(MaskCreation, plain('a'), PrevImage),
        ShortcutBinding::new(MaskCreation, plain('c'), ToggleCategorySelector),
    ]
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a binding list. A later binding for the same state and
    /// combination replaces an earlier one.
    pub fn from_bindings(bindings: impl IntoIterator<Item = ShortcutBinding>) -> Self {
        let mut result = Self {
            bindings: Vec::new(),
        };
        for binding in bindings {
            result.set_binding(binding);
        }
        result
    }

    pub fn bindings(&self) -> &[ShortcutBinding] {
        &self.bindings
    }

    /// Get the action a combination triggers in `state`, if any.
    pub fn action_for(&self, state: InteractionState, combo: &KeyCombo) -> Option<ShortcutAction> {
        self.bindings
            .iter()
            .find(|b| b.state == state && b.combo == *combo)
            .map(|b| b.action)
    }

    /// Add a binding, replacing whatever `(state, combo)` was bound to.
    ///
    /// Returns the action that was previously bound.
    pub fn set_binding(&mut self, binding: ShortcutBinding) -> Option<ShortcutAction> {
        match self
            .bindings
            .iter_mut()
            .find(|b| b.state == binding.state && b.combo == binding.combo)
        {
            Some(existing) => {
                let previous = existing.action;
                existing.action = binding.action;
                Some(previous)
            }
            None => {
                self.bindings.push(binding);
                None
            }
        }
    }
}
