//! History snapshots of the annotation state.

use coralseg_ui::{HistoryError, Snapshot};
use serde::{Deserialize, Serialize};

use crate::model::{AnnotationData, CategoryInfo};

/// Snapshot of everything an undo step restores: the image annotations and
/// the category list they refer to.
///
/// Records are plain owned values; cloning one copies every mask and category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: AnnotationData,
    pub category_info: CategoryInfo,
}

impl Record {
    pub fn new(data: AnnotationData, category_info: CategoryInfo) -> Self {
        Self {
            data,
            category_info,
        }
    }

    pub fn data(&self) -> &AnnotationData {
        &self.data
    }

    pub fn category_info(&self) -> &CategoryInfo {
        &self.category_info
    }

    /// Parse a record from JSON, reporting missing or malformed fields as an
    /// invalid record.
    pub fn from_json(json: &str) -> Result<Self, HistoryError> {
        let record: Self =
            serde_json::from_str(json).map_err(|e| HistoryError::invalid_record(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }
}

impl Snapshot for Record {
    fn validate(&self) -> Result<(), HistoryError> {
        if !self.data.has_unique_mask_ids() {
            return Err(HistoryError::invalid_record(format!(
                "duplicate mask ids in '{}'",
                self.data.image_name
            )));
        }

        if let Some(mask) = self
            .data
            .masks
            .iter()
            .find(|m| !self.category_info.is_known(m.category_id))
        {
            return Err(HistoryError::invalid_record(format!(
                "mask {} references unknown category {}",
                mask.id, mask.category_id
            )));
        }

        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "{} ({} masks, {} categories)",
            self.data.image_name,
            self.data.masks.len(),
            self.category_info.len()
        )
    }
}
