//! OCR abstraction: recognized text regions and the engines that produce them.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::{PureOcrFactory, PureOcrRecognizer};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::models::assembly::AssembledModels;
use crate::models::config::OcrConfig;

/// A detected text region with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// A box with text only, for engines that report no geometry.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            bbox: [0.0; 8],
            text: text.into(),
            confidence: 1.0,
        }
    }

    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
///
/// Boxes are in reading order. Stamp extraction only looks at the first two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized text regions.
    pub boxes: Vec<TextBox>,

    /// Full text (boxes joined with newlines).
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Create an empty result.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            boxes: Vec::new(),
            text: String::new(),
            processing_time_ms: 0,
            image_size: (width, height),
        }
    }

    /// Build a result from lines of text, in the given order.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let boxes: Vec<TextBox> = lines.iter().map(|l| TextBox::from_text(l.as_ref())).collect();
        let mut result = Self::empty(0, 0);
        result.boxes = boxes;
        result.rebuild_text();
        result
    }

    /// Text of the region at `index`, if recognized.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.boxes.get(index).map(|b| b.text.as_str())
    }

    /// Sort boxes by reading order (top-to-bottom, left-to-right).
    pub fn sort_by_reading_order(&mut self) {
        self.boxes.sort_by(|a, b| {
            let (_, ay, _, _) = a.rect();
            let (_, by, _, _) = b.rect();

            // Group by approximate vertical position (within 20 pixels)
            let row_a = (ay / 20.0) as i32;
            let row_b = (by / 20.0) as i32;

            if row_a != row_b {
                row_a.cmp(&row_b)
            } else {
                let (ax, _, _, _) = a.rect();
                let (bx, _, _, _) = b.rect();
                ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        self.rebuild_text();
    }

    fn rebuild_text(&mut self) {
        self.text = self
            .boxes
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }
}

/// An OCR engine that reads an image file into ordered text regions.
pub trait Recognizer: Send + Sync {
    /// Recognize text in the image at `image_path`.
    fn recognize(&self, image_path: &Path) -> Result<OcrResult, OcrError>;
}

/// Builds a recognizer against an assembled model directory.
///
/// Called once per pipeline; the recognizer it returns is reused for every
/// later call.
pub trait RecognizerFactory: Send + Sync {
    fn create(
        &self,
        models: &AssembledModels,
        config: &OcrConfig,
    ) -> Result<Box<dyn Recognizer>, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(text: &str, x: f32, y: f32) -> TextBox {
        TextBox {
            bbox: [x, y, x + 100.0, y, x + 100.0, y + 15.0, x, y + 15.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order() {
        let mut result = OcrResult::empty(800, 600);
        result.boxes = vec![
            boxed("NND Project Number", 10.0, 60.0),
            boxed("Section 3.3", 300.0, 12.0),
            boxed("Declassified", 10.0, 10.0),
        ];
        result.sort_by_reading_order();

        assert_eq!(result.line(0), Some("Declassified"));
        assert_eq!(result.line(1), Some("Section 3.3"));
        assert_eq!(result.line(2), Some("NND Project Number"));
        assert_eq!(result.line(3), None);
        assert_eq!(result.text, "Declassified\nSection 3.3\nNND Project Number");
    }

    #[test]
    fn test_from_lines_keeps_order() {
        let result = OcrResult::from_lines(&["first", "second"]);
        assert_eq!(result.boxes.len(), 2);
        assert_eq!(result.text, "first\nsecond");
    }
}
