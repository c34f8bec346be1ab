//! Declassification stamp extraction.

mod parser;
pub mod rules;

pub use parser::StampParser;

use crate::error::ExtractionError;
use crate::models::metadata::DocumentMetadata;
use crate::ocr::OcrResult;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for stamp metadata extractors.
pub trait StampExtractor {
    /// Extract stamp metadata from an OCR result.
    fn extract(&self, ocr_result: &OcrResult) -> Result<DocumentMetadata>;

    /// Extract stamp metadata from recognized lines, in reading order.
    fn extract_from_lines(&self, lines: &[&str]) -> Result<DocumentMetadata>;
}
