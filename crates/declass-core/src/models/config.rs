//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::assembly::AssemblyPlan;

/// Main configuration for the declass pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclassConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Model file locations.
    pub models: ModelConfig,

    /// Metadata extraction configuration.
    pub extraction: ExtractionConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognition language. The recognizer is restricted to this one language.
    pub language: String,

    /// Keep `[UNK]` tokens in recognized text instead of replacing them with spaces.
    pub keep_unk: bool,

    /// Drop regions whose confidence is below this threshold (0.0 - 1.0).
    pub min_confidence: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            keep_unk: false,
            min_confidence: 0.0,
        }
    }
}

/// Model file names and directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory holding the staged model artifacts (split parts and companions).
    pub import_dir: PathBuf,

    /// Working directory the models are assembled into.
    pub model_dir: PathBuf,

    /// File name of the reassembled detection model.
    pub detection_model: String,

    /// Staged parts of the detection model, in concatenation order.
    pub detection_parts: Vec<String>,

    /// Text recognition model file name (copied as-is).
    pub recognition_model: String,

    /// Character dictionary file name (copied as-is).
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            import_dir: PathBuf::from("import"),
            model_dir: std::env::temp_dir().join("declass-models"),
            detection_model: "det.onnx".to_string(),
            detection_parts: vec![
                "det.onnx.1".to_string(),
                "det.onnx.2".to_string(),
                "det.onnx.3".to_string(),
            ],
            recognition_model: "en_rec.onnx".to_string(),
            dictionary: "en_dict.txt".to_string(),
        }
    }
}

impl ModelConfig {
    /// Build the assembly plan: the split detection model plus the copied companions.
    pub fn plan(&self) -> AssemblyPlan {
        AssemblyPlan::new(&self.detection_model, self.detection_parts.clone())
            .with_copy(&self.recognition_model)
            .with_copy(&self.dictionary)
    }
}

/// Metadata extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Directory for per-call scratch images (system temp dir when unset).
    pub scratch_dir: Option<PathBuf>,
}

impl DeclassConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Get full path to a file in the assembled model directory.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.models.model_dir.join(model_name)
    }
}
