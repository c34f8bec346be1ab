//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use image::GenericImageView;
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::assembly::AssembledModels;
use crate::models::config::{ModelConfig, OcrConfig};

use super::{OcrResult, Recognizer, RecognizerFactory, TextBox};

/// Languages with a recognition model and dictionary in the staged set.
const SUPPORTED_LANGUAGES: &[&str] = &["en"];

/// Recognizer backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
///
/// Inference runs one image at a time behind the engine lock.
pub struct PureOcrRecognizer {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
    config: OcrConfig,
}

// SAFETY: `OcrEngine` is `!Send` only because it holds `Arc`s to sessions with
// internal `RefCell` caches. Every clone of those `Arc`s lives inside the engine
// (none are exposed), so moving the whole engine between threads is sound, and
// the `Mutex` serializes all access to it.
unsafe impl Send for PureOcrRecognizer {}
unsafe impl Sync for PureOcrRecognizer {}

impl PureOcrRecognizer {
    /// Load the engine from explicit model paths.
    pub fn from_paths(
        det_path: &Path,
        rec_path: &Path,
        dict_path: &Path,
        config: OcrConfig,
    ) -> Result<Self, OcrError> {
        if !SUPPORTED_LANGUAGES.contains(&config.language.as_str()) {
            return Err(OcrError::UnsupportedLanguage(config.language.clone()));
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(det_path)
            .rec_model_path(rec_path)
            .dictionary_path(dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!(
            "Loaded pure-onnx-ocr engine ({}) from {}",
            config.language,
            det_path.parent().unwrap_or(det_path).display()
        );

        Ok(Self {
            engine: Mutex::new(engine),
            config,
        })
    }
}

impl Recognizer for PureOcrRecognizer {
    fn recognize(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        let start = Instant::now();

        let image = image::open(image_path)
            .map_err(|e| OcrError::InvalidImage(format!("{}: {}", image_path.display(), e)))?;
        let (width, height) = image.dimensions();

        debug!("Recognizing image: {}x{}", width, height);

        let results = self
            .engine
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .run_from_image(&image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let boxes: Vec<TextBox> = results
            .iter()
            .filter(|r| r.confidence >= self.config.min_confidence)
            .map(|r| {
                let text = if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                TextBox {
                    bbox: polygon_to_bbox(&r.bounding_box),
                    text,
                    confidence: r.confidence,
                }
            })
            .collect();

        let mut result = OcrResult::empty(width, height);
        result.boxes = boxes;
        result.sort_by_reading_order();
        result.processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "OCR complete: {} text boxes in {}ms",
            result.boxes.len(),
            result.processing_time_ms
        );

        Ok(result)
    }
}

/// Builds [`PureOcrRecognizer`]s from the file names in a [`ModelConfig`].
#[derive(Debug, Clone, Default)]
pub struct PureOcrFactory {
    models: ModelConfig,
}

impl PureOcrFactory {
    pub fn new(models: ModelConfig) -> Self {
        Self { models }
    }
}

impl RecognizerFactory for PureOcrFactory {
    fn create(
        &self,
        models: &AssembledModels,
        config: &OcrConfig,
    ) -> Result<Box<dyn Recognizer>, OcrError> {
        let recognizer = PureOcrRecognizer::from_paths(
            &models.artifact,
            &models.path(&self.models.recognition_model),
            &models.path(&self.models.dictionary),
            config.clone(),
        )?;
        Ok(Box::new(recognizer))
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
///
/// Extracts the first 4 exterior points (quadrilateral) as
/// `[x1, y1, x2, y2, x3, y3, x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
