//! Headless replay of recorded editor sessions.
//!
//! A script holds the initial annotations and categories of one image and a
//! list of input steps. Replaying it drives a [`Workbench`] exactly like the
//! browser front end would and reports the resulting state.

use std::path::Path;

use coralseg_ui::{KeyCombo, MouseButton};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::Workbench;
use crate::config::AppConfig;
use crate::keybindings::ShortcutAction;
use crate::mode::InteractionState;
use crate::model::{AnnotationData, CategoryInfo, CocoDocument, PromptPoint};
use crate::session::SessionError;

/// Errors that can occur while loading or replaying a script.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid script: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// One input step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    /// A key press. `suppressed` marks a press inside a text input.
    Key {
        combo: KeyCombo,
        #[serde(default)]
        suppressed: bool,
    },
    /// A canvas click on an image pixel.
    Click { button: MouseButton, x: u32, y: u32 },
    /// A toolbar button.
    Button { action: ShortcutAction },
    /// Assign a category to the selected masks.
    Label { category_id: i64 },
    /// Create a category.
    AddCategory { name: String },
    /// Switch to another image, optionally with its own category list.
    OpenImage {
        data: AnnotationData,
        #[serde(default)]
        categories: Option<CategoryInfo>,
    },
}

/// A recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub data: AnnotationData,
    #[serde(default)]
    pub categories: CategoryInfo,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

/// State after replaying a script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub state: InteractionState,
    pub undo_count: usize,
    pub redo_count: usize,
    pub selected: Vec<u64>,
    /// Masks still waiting for a label
    pub unlabelled: usize,
    pub prompts: Vec<PromptPoint>,
    /// Host requests raised during the replay, in order
    pub requests: Vec<ShortcutAction>,
    pub categories: CategoryInfo,
    pub annotations: CocoDocument,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Replay every step on a fresh workbench.
    ///
    /// Step failures (e.g. labelling with an unknown category) are logged and
    /// the replay continues, the way the editor keeps running after a failed
    /// edit.
    pub fn replay(&self, config: &AppConfig) -> Result<ReplayReport, ScriptError> {
        let mut workbench =
            Workbench::new(config, self.data.clone(), self.categories.clone())?;

        let mut requests = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            log::debug!("Step {}: {:?}", index, step);
            if let Err(e) = apply_step(&mut workbench, step) {
                log::warn!("Step {} failed: {}", index, e);
            }
            requests.extend(workbench.take_requests());
        }

        let session = workbench.session();
        Ok(ReplayReport {
            state: workbench.state(),
            undo_count: session.history().undo_count(),
            redo_count: session.history().redo_count(),
            selected: session.selected_masks(),
            unlabelled: session.data().masks.iter().filter(|m| m.is_unlabelled()).count(),
            prompts: session.prompts().to_vec(),
            requests,
            categories: session.categories().clone(),
            annotations: session.data().to_coco(),
        })
    }
}

fn apply_step(workbench: &mut Workbench, step: &ScriptStep) -> Result<(), SessionError> {
    match step {
        ScriptStep::Key { combo, suppressed } => {
            let outcome = if *suppressed {
                let event = workbench
                    .key_event(combo.key, combo.modifiers)
                    .from_shortcut_free_target();
                workbench.dispatch(&event)
            } else {
                workbench.key_down(combo.key, combo.modifiers)
            };
            log::trace!("Key '{}' -> {:?}", combo, outcome);
        }
        ScriptStep::Click { button, x, y } => {
            workbench.click(*button, *x, *y);
        }
        ScriptStep::Button { action } => workbench.perform(*action),
        ScriptStep::Label { category_id } => {
            workbench
                .session_mut()
                .set_category_for_selected(*category_id)?;
        }
        ScriptStep::AddCategory { name } => {
            workbench.session_mut().add_category(name)?;
        }
        ScriptStep::OpenImage { data, categories } => match categories {
            Some(categories) => {
                workbench.open_image_with_categories(data.clone(), categories.clone())
            }
            None => workbench.open_image(data.clone()),
        },
    }
    Ok(())
}
