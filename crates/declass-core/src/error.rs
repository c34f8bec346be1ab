//! Error types for the declass-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the declass library.
#[derive(Error, Debug)]
pub enum DeclassError {
    /// Model assembly error.
    #[error("model assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// Image payload error.
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Metadata extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Errors raised while rebuilding model files from staged artifacts.
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// A staged artifact could not be opened or read.
    #[error("failed to read staged artifact {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The model directory or a file inside it could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The plan names no parts for the split artifact.
    #[error("no parts configured for {0}")]
    NoParts(String),

    /// A split was requested with an invalid part count.
    #[error("cannot split into {0} parts")]
    InvalidPartCount(usize),
}

/// Errors related to decoding the uploaded image payload.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// The payload contains no bytes.
    #[error("image payload is empty")]
    Empty,

    /// Hex strings must have an even number of digits.
    #[error("hex payload has odd length {0}")]
    OddLength(usize),

    /// A character outside `[0-9a-fA-F]` was found.
    #[error("invalid hex digit {digit:?} at position {position}")]
    InvalidDigit { digit: char, position: usize },

    /// The scratch file could not be created or written.
    #[error("failed to write scratch image: {0}")]
    Scratch(#[source] std::io::Error),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The requested recognition language is not available.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Which stamp pattern failed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampPattern {
    /// "Declassified per Executive Order ..., Section ..." line.
    Declassification,
    /// "NND Project Number: ... By: ... NND Date: ..." line.
    Nnd,
}

impl std::fmt::Display for StampPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StampPattern::Declassification => write!(f, "declassification"),
            StampPattern::Nnd => write!(f, "NND"),
        }
    }
}

/// Errors related to metadata extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Recognition returned fewer regions than the stamp needs.
    #[error("insufficient recognized text regions: found {found}, need {required}")]
    InsufficientRegions { found: usize, required: usize },

    /// A stamp line did not have the expected shape.
    #[error("metadata pattern did not match expected format: {pattern} line {text:?}")]
    PatternMismatch { pattern: StampPattern, text: String },

    /// A captured field was blank.
    #[error("field {0} is empty")]
    EmptyField(&'static str),
}

/// Result type for the declass library.
pub type Result<T> = std::result::Result<T, DeclassError>;
