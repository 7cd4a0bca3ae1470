//! Per-image annotation state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::category::{CategoryInfo, PROMPT_ID, UNDEFINED_ID};
use super::error::ModelError;
use super::mask::Mask;

/// Annotations of the image currently open in the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationData {
    pub image_name: String,
    pub image_path: String,
    /// Index of the image within the project
    pub idx: u64,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub masks: Vec<Mask>,
}

/// COCO image entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoImage {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

/// COCO document holding one image and its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoDocument {
    pub images: Vec<CocoImage>,
    pub annotations: Vec<Mask>,
}

/// Payload returned by the backend when an image is opened.
#[derive(Debug, Deserialize)]
struct ImageResponse {
    image_name: String,
    image_path: String,
    idx: u64,
    segmentation: CocoDocument,
}

impl AnnotationData {
    /// Parse the backend's image payload.
    pub fn from_response(json: &str) -> Result<Self, ModelError> {
        let response: ImageResponse = serde_json::from_str(json)?;
        let image = response
            .segmentation
            .images
            .first()
            .ok_or_else(|| ModelError::MissingField {
                field: "segmentation.images[0]".to_string(),
            })?;

        Ok(Self {
            image_name: response.image_name,
            image_path: response.image_path,
            idx: response.idx,
            image_width: image.width,
            image_height: image.height,
            masks: response.segmentation.annotations,
        })
    }

    /// Export as a single-image COCO document.
    pub fn to_coco(&self) -> CocoDocument {
        CocoDocument {
            images: vec![CocoImage {
                id: self.idx,
                file_name: self.image_name.clone(),
                width: self.image_width,
                height: self.image_height,
            }],
            annotations: self.masks.clone(),
        }
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    pub fn mask(&self, id: u64) -> Option<&Mask> {
        self.masks.iter().find(|m| m.id == id)
    }

    /// Lowest id not used by any mask.
    pub fn find_available_mask_id(&self) -> u64 {
        let used: HashSet<u64> = self.masks.iter().map(|m| m.id).collect();
        (0..).find(|id| !used.contains(id)).unwrap_or_default()
    }

    /// Add a mask, assigning it a fresh id. A prompting mask becomes an
    /// unlabelled one. Returns the assigned id.
    pub fn add_mask(&mut self, mut mask: Mask) -> u64 {
        mask.id = self.find_available_mask_id();
        if mask.category_id == PROMPT_ID {
            mask.category_id = UNDEFINED_ID;
        }
        let id = mask.id;
        self.masks.push(mask);

        if !self.has_unique_mask_ids() {
            log::error!("Mask ids are not unique after adding mask {}", id);
        }
        id
    }

    /// Remove the mask with `id`, returning it.
    pub fn remove_mask(&mut self, id: u64) -> Option<Mask> {
        let index = self.masks.iter().position(|m| m.id == id)?;
        Some(self.masks.remove(index))
    }

    /// Change the category of a mask.
    pub fn set_mask_category(&mut self, id: u64, category_id: i64) -> Result<(), ModelError> {
        let mask = self
            .masks
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(ModelError::MaskNotFound { id })?;
        mask.category_id = category_id;
        Ok(())
    }

    /// Ids of every mask containing pixel `(x, y)`.
    pub fn masks_at(&self, x: u32, y: u32) -> Vec<u64> {
        self.masks
            .iter()
            .filter(|m| m.contains_pixel(x, y))
            .map(|m| m.id)
            .collect()
    }

    pub fn has_unique_mask_ids(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.masks.len());
        self.masks.iter().all(|m| seen.insert(m.id))
    }

    /// Unlabel every mask whose category `categories` does not know.
    /// Returns how many masks changed.
    pub fn unlabel_unknown(&mut self, categories: &CategoryInfo) -> usize {
        let mut changed = 0;
        for mask in self
            .masks
            .iter_mut()
            .filter(|m| !categories.is_known(m.category_id))
        {
            log::warn!(
                "Mask {} references unknown category {}, unlabelling it",
                mask.id,
                mask.category_id
            );
            mask.category_id = UNDEFINED_ID;
            changed += 1;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "image_name": "reef_01.jpg",
        "image_path": "/data/reef_01.jpg",
        "idx": 4,
        "segmentation": {
            "images": [{ "id": 4, "file_name": "reef_01.jpg", "width": 4, "height": 3 }],
            "annotations": [
                {
                    "id": 0,
                    "image_id": 4,
                    "category_id": 1,
                    "segmentation": { "size": [3, 4], "counts": "xyz" },
                    "rle": [5, 2, 2, 2, 1],
                    "area": 4.0,
                    "bbox": [1.0, 1.0, 2.0, 2.0],
                    "iscrowd": 0
                }
            ]
        }
    }"#;

    #[test]
    fn test_from_response() {
        let data = AnnotationData::from_response(RESPONSE).unwrap();
        assert_eq!(data.image_name, "reef_01.jpg");
        assert_eq!(data.idx, 4);
        assert_eq!((data.image_width, data.image_height), (4, 3));
        assert_eq!(data.masks.len(), 1);
        assert_eq!(data.masks_at(1, 1), vec![0]);
    }

    #[test]
    fn test_from_response_requires_image_entry() {
        let json = r#"{"image_name":"a","image_path":"b","idx":0,
            "segmentation":{"images":[],"annotations":[]}}"#;
        assert!(matches!(
            AnnotationData::from_response(json),
            Err(ModelError::MissingField { .. })
        ));
        assert!(matches!(
            AnnotationData::from_response(r#"{"image_name":"a"}"#),
            Err(ModelError::Json(_))
        ));
    }

    #[test]
    fn test_unlabel_unknown() {
        let mut data = AnnotationData::from_response(RESPONSE).unwrap();
        assert_eq!(data.unlabel_unknown(&CategoryInfo::default()), 1);
        assert!(data.masks[0].is_unlabelled());
        // Already unlabelled masks are known
        assert_eq!(data.unlabel_unknown(&CategoryInfo::default()), 0);
    }

    #[test]
    fn test_add_mask_assigns_lowest_free_id() {
        let mut data = AnnotationData::default();
        let first = data.add_mask(Mask::from_rle(7, 0, 1, 1, vec![0, 1]));
        let second = data.add_mask(Mask::from_rle(7, PROMPT_ID, 1, 1, vec![0, 1]));
        assert_eq!((first, second), (0, 1));
        assert_eq!(data.mask(1).unwrap().category_id, UNDEFINED_ID);

        data.remove_mask(0).unwrap();
        assert_eq!(data.find_available_mask_id(), 0);
        assert!(data.has_unique_mask_ids());
    }

    #[test]
    fn test_set_mask_category() {
        let mut data = AnnotationData::from_response(RESPONSE).unwrap();
        data.set_mask_category(0, 5).unwrap();
        assert_eq!(data.mask(0).unwrap().category_id, 5);
        assert!(matches!(
            data.set_mask_category(9, 5),
            Err(ModelError::MaskNotFound { id: 9 })
        ));
    }

    #[test]
    fn test_to_coco() {
        let data = AnnotationData::from_response(RESPONSE).unwrap();
        let coco = data.to_coco();
        assert_eq!(coco.images[0].file_name, "reef_01.jpg");
        assert_eq!(coco.annotations, data.masks);
    }
}
