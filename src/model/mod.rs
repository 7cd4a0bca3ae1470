//! Data models for the annotation editor.

mod category;
mod data;
mod error;
mod mask;
mod prompt;

pub use category::{CategoryEntry, CategoryInfo, PROMPT_ID, UNDEFINED_ID};
pub use data::{AnnotationData, CocoDocument, CocoImage};
pub use error::ModelError;
pub use mask::{Mask, Segmentation};
pub use prompt::{Polarity, PromptPoint};
