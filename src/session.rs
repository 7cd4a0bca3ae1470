//! Editing session for the image currently open in the editor.
//!
//! The session owns the live annotation data, the category list, the mask
//! selection, the prompt points and the undo history. Every undoable edit
//! records a [`Record`] of the state *before* the change.

use std::collections::BTreeSet;

use coralseg_ui::{HistoryError, HistoryStore, Snapshot};
use thiserror::Error;

use crate::model::{
    AnnotationData, CategoryInfo, Mask, ModelError, Polarity, PromptPoint, UNDEFINED_ID,
};
use crate::record::Record;

/// Errors that can occur while editing.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Annotation state of one open image plus its undo history.
#[derive(Debug)]
pub struct AnnotationSession {
    data: AnnotationData,
    categories: CategoryInfo,
    history: HistoryStore<Record>,
    /// Ids of the selected masks
    selection: BTreeSet<u64>,
    prompts: Vec<PromptPoint>,
}

impl AnnotationSession {
    /// Open a session keeping at most `history_capacity` undo steps.
    ///
    /// Masks referencing a category missing from `categories` are unlabelled,
    /// so that every later snapshot is a valid record.
    pub fn new(
        mut data: AnnotationData,
        categories: CategoryInfo,
        history_capacity: usize,
    ) -> Result<Self, SessionError> {
        data.unlabel_unknown(&categories);
        Ok(Self {
            data,
            categories,
            history: HistoryStore::with_capacity(history_capacity)?,
            selection: BTreeSet::new(),
            prompts: Vec::new(),
        })
    }

    pub fn data(&self) -> &AnnotationData {
        &self.data
    }

    pub fn categories(&self) -> &CategoryInfo {
        &self.categories
    }

    pub fn history(&self) -> &HistoryStore<Record> {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Record {
        Record::new(self.data.clone(), self.categories.clone())
    }

    /// Switch to another image. History and selection belong to the previous
    /// image and are dropped. Masks with unknown categories are unlabelled.
    pub fn open_image(&mut self, mut data: AnnotationData) {
        log::info!("Opened '{}' with {} masks", data.image_name, data.masks.len());
        data.unlabel_unknown(&self.categories);
        self.data = data;
        self.history.clear();
        self.selection.clear();
        self.prompts.clear();
    }

    /// Switch to another image together with the category list its masks use.
    pub fn open_image_with_categories(&mut self, data: AnnotationData, categories: CategoryInfo) {
        self.categories = categories;
        self.open_image(data);
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Record the current state into the history.
    pub fn record_data(&mut self) -> Result<(), SessionError> {
        let record = self.snapshot();
        self.history.record(&record)?;
        Ok(())
    }

    /// Restore the previous state. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, SessionError> {
        let current = self.snapshot();
        match self.history.undo(&current)? {
            Some(previous) => {
                self.load_record(previous);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Re-apply the last undone state. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(next) => {
                self.load_record(next);
                true
            }
            None => false,
        }
    }

    /// Replace the live state with a record. Selection and prompts refer to
    /// the replaced state and are cleared.
    pub fn load_record(&mut self, record: Record) {
        self.selection.clear();
        self.prompts.clear();
        self.categories = record.category_info;
        self.data = record.data;
    }

    // ========================================================================
    // Undoable edits
    // ========================================================================

    /// Delete the selected masks. Returns how many were removed.
    pub fn remove_selected_masks(&mut self) -> Result<usize, SessionError> {
        if self.selection.is_empty() {
            return Ok(0);
        }
        self.record_data()?;

        let removed = std::mem::take(&mut self.selection)
            .into_iter()
            .filter_map(|id| self.data.remove_mask(id))
            .count();
        log::debug!("Removed {} masks", removed);
        Ok(removed)
    }

    /// Assign `category_id` to every selected mask and clear the selection.
    /// Returns how many masks were relabelled.
    pub fn set_category_for_selected(&mut self, category_id: i64) -> Result<usize, SessionError> {
        if !self.categories.is_known(category_id) {
            return Err(ModelError::CategoryNotFound { id: category_id }.into());
        }
        if self.selection.is_empty() {
            return Ok(0);
        }
        self.record_data()?;

        let selected = std::mem::take(&mut self.selection);
        for &id in &selected {
            self.data.set_mask_category(id, category_id)?;
        }
        Ok(selected.len())
    }

    /// Add a newly created mask. The prompts that produced it are cleared.
    pub fn add_mask(&mut self, mask: Mask) -> Result<u64, SessionError> {
        if !self.categories.is_known(mask.category_id) {
            return Err(ModelError::CategoryNotFound {
                id: mask.category_id,
            }
            .into());
        }
        self.record_data()?;
        self.prompts.clear();
        Ok(self.data.add_mask(mask))
    }

    /// Add a category. Duplicate names are rejected without touching history.
    pub fn add_category(&mut self, name: &str) -> Result<i64, SessionError> {
        if self.categories.contains_name(name) {
            return Err(ModelError::DuplicateCategoryName {
                name: name.to_string(),
            }
            .into());
        }
        self.record_data()?;
        Ok(self.categories.add_category(name, None)?)
    }

    pub fn rename_category(&mut self, id: i64, new_name: &str) -> Result<(), SessionError> {
        if self.categories.get(id).is_none() {
            return Err(ModelError::CategoryNotFound { id }.into());
        }
        self.record_data()?;
        Ok(self.categories.rename_category(id, new_name)?)
    }

    /// Remove a category. Masks labelled with it become unlabelled.
    pub fn remove_category(&mut self, id: i64) -> Result<(), SessionError> {
        if self.categories.get(id).is_none() {
            return Err(ModelError::CategoryNotFound { id }.into());
        }
        self.record_data()?;

        self.categories.remove_category(id);
        for mask in self.data.masks.iter_mut().filter(|m| m.category_id == id) {
            mask.category_id = UNDEFINED_ID;
        }
        Ok(())
    }

    /// Replace the whole category list, e.g. after loading a project.
    /// Masks whose category disappears become unlabelled.
    ///
    /// If the live state is not a valid record (e.g. data edited in place
    /// before its categories arrived), the replacement still happens but no
    /// undo step is recorded.
    pub fn replace_categories(&mut self, categories: CategoryInfo) -> Result<(), SessionError> {
        let current = self.snapshot();
        match current.validate() {
            Ok(()) => self.history.record(&current)?,
            Err(e) => log::warn!("Replacing categories without an undo step: {}", e),
        }
        self.data.unlabel_unknown(&categories);
        self.categories = categories;
        Ok(())
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Toggle the selection of every mask containing pixel `(x, y)`.
    /// Returns how many masks were toggled.
    pub fn toggle_mask_at(&mut self, x: u32, y: u32) -> usize {
        let hits = self.data.masks_at(x, y);
        for id in &hits {
            if !self.selection.remove(id) {
                self.selection.insert(*id);
            }
        }
        hits.len()
    }

    pub fn select_mask(&mut self, id: u64) -> Result<(), SessionError> {
        if self.data.mask(id).is_none() {
            return Err(ModelError::MaskNotFound { id }.into());
        }
        self.selection.insert(id);
        Ok(())
    }

    /// Ids of the selected masks in ascending order.
    pub fn selected_masks(&self) -> Vec<u64> {
        self.selection.iter().copied().collect()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ========================================================================
    // Prompts
    // ========================================================================

    pub fn add_prompt(&mut self, x: u32, y: u32, polarity: Polarity) {
        self.prompts.push(PromptPoint::new(x, y, polarity));
    }

    /// Remove the most recent prompt point.
    pub fn undo_prompt(&mut self) -> Option<PromptPoint> {
        self.prompts.pop()
    }

    pub fn clear_prompts(&mut self) {
        self.prompts.clear();
    }

    pub fn prompts(&self) -> &[PromptPoint] {
        &self.prompts
    }
}
