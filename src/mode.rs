//! Interaction modes of the annotation canvas.

use std::fmt;
use std::str::FromStr;

use coralseg_ui::ShortcutError;
use serde::{Deserialize, Serialize};

/// The mutually exclusive modes the editor can be in.
///
/// Shortcuts and canvas clicks are routed according to the active mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionState {
    /// Browsing and selecting existing masks
    #[default]
    #[serde(alias = "default", alias = "maskSelect")]
    MaskSelection,
    /// Placing prompt points for a new mask
    #[serde(alias = "maskCreate")]
    MaskCreation,
}

impl InteractionState {
    /// All modes, default first.
    pub fn all() -> &'static [InteractionState] {
        &[InteractionState::MaskSelection, InteractionState::MaskCreation]
    }

    /// Tag used in configuration files.
    pub fn tag(&self) -> &'static str {
        match self {
            InteractionState::MaskSelection => "maskSelection",
            InteractionState::MaskCreation => "maskCreation",
        }
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for InteractionState {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maskSelection" | "maskSelect" | "default" => Ok(InteractionState::MaskSelection),
            "maskCreation" | "maskCreate" => Ok(InteractionState::MaskCreation),
            other => Err(ShortcutError::UnknownState(other.to_string())),
        }
    }
}
