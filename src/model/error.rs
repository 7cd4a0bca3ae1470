//! Error types for the annotation data model.

use thiserror::Error;

/// Errors that can occur while reading or editing annotation data.
#[derive(Error, Debug)]
pub enum ModelError {
    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Required field is missing
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// A category with this name already exists
    #[error("Category '{name}' already exists")]
    DuplicateCategoryName {
        /// The rejected name
        name: String,
    },

    /// Category ID referenced but not defined
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// The missing category ID
        id: i64,
    },

    /// Mask ID referenced but not present
    #[error("Mask not found: {id}")]
    MaskNotFound {
        /// The missing mask ID
        id: u64,
    },
}
