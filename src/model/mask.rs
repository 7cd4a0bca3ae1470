//! Segmentation masks produced by the backend.

use serde::{Deserialize, Serialize};

use super::category::UNDEFINED_ID;

/// COCO segmentation block. Only `size` is interpreted; everything else
/// (compressed `counts`, polygons...) is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    /// `[height, width]` of the mask
    pub size: [u32; 2],
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One annotated mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub id: u64,
    #[serde(default)]
    pub image_id: i64,
    pub category_id: i64,
    pub segmentation: Segmentation,
    /// Row-major run lengths, alternating background and foreground and
    /// starting with background.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rle: Vec<u32>,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub bbox: [f64; 4],
    #[serde(default)]
    pub iscrowd: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_iou: Option<f64>,
}

impl Mask {
    /// Create a mask of `width` x `height` pixels from run lengths.
    pub fn from_rle(id: u64, category_id: i64, width: u32, height: u32, rle: Vec<u32>) -> Self {
        let area = rle.iter().skip(1).step_by(2).map(|&run| f64::from(run)).sum();
        Self {
            id,
            image_id: 0,
            category_id,
            segmentation: Segmentation {
                size: [height, width],
                extra: serde_json::Map::new(),
            },
            rle,
            area,
            bbox: [0.0; 4],
            iscrowd: 0,
            predicted_iou: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.segmentation.size[1]
    }

    pub fn height(&self) -> u32 {
        self.segmentation.size[0]
    }

    /// Whether this mask still needs a label.
    pub fn is_unlabelled(&self) -> bool {
        self.category_id == UNDEFINED_ID
    }

    /// Whether pixel `(x, y)` lies inside the mask.
    ///
    /// Walks the run lengths instead of decoding the full bitmap.
    pub fn contains_pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width() || y >= self.height() {
            return false;
        }

        let index = u64::from(y) * u64::from(self.width()) + u64::from(x);
        let mut start = 0u64;
        for (i, &run) in self.rle.iter().enumerate() {
            let end = start + u64::from(run);
            if index < end {
                return i % 2 == 1;
            }
            start = end;
        }
        false
    }
}
