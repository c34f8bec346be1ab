//! Core library for declassified document metadata extraction.
//!
//! This crate provides:
//! - Model file assembly from split, staged artifacts
//! - Hex payload decoding into per-call scratch images
//! - OCR abstraction with a `pure-onnx-ocr` engine
//! - Declassification stamp parsing (executive order, section, NND project
//!   number, author, date)

pub mod error;
pub mod models;
pub mod ocr;
pub mod payload;
pub mod pipeline;
pub mod stamp;

pub use error::{DeclassError, Result};
pub use models::assembly::{ArtifactSource, AssembledModels, AssemblyPlan, DirectorySource, ModelAssembler};
pub use models::config::DeclassConfig;
pub use models::metadata::{DocumentMetadata, ProcessedDocument};
pub use ocr::{OcrResult, Recognizer, RecognizerFactory, TextBox};
#[cfg(feature = "native")]
pub use ocr::{PureOcrFactory, PureOcrRecognizer};
pub use payload::ImagePayload;
pub use pipeline::MetadataPipeline;
pub use stamp::{StampExtractor, StampParser};
