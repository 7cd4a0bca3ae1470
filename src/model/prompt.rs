//! Prompt points placed while creating a new mask.

use serde::{Deserialize, Serialize};

/// Whether a prompt marks the object or the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

/// A prompt point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPoint {
    pub x: u32,
    pub y: u32,
    pub polarity: Polarity,
}

impl PromptPoint {
    pub fn new(x: u32, y: u32, polarity: Polarity) -> Self {
        Self { x, y, polarity }
    }
}
