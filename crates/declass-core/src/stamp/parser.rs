//! Stamp parser applying the two line rules to the first recognized regions.

use tracing::debug;

use crate::error::{ExtractionError, StampPattern};
use crate::models::metadata::{DocumentMetadata, FIELD_NAMES};
use crate::ocr::OcrResult;

use super::rules::{extract_declassification, extract_nnd};
use super::{Result, StampExtractor};

/// Regions the stamp occupies: the declassification line, then the NND line.
const STAMP_LINES: usize = 2;

/// Parses the declassification stamp from the top of a scanned page.
///
/// Line 0 must carry "Declassified per Executive Order ..., Section ...",
/// line 1 "NND Project Number: ... By: ... NND Date: ...". Later lines are
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct StampParser;

impl StampParser {
    pub fn new() -> Self {
        Self
    }

    fn parse(&self, declassification_line: &str, nnd_line: &str) -> Result<DocumentMetadata> {
        let declassification = extract_declassification(declassification_line).ok_or_else(|| {
            ExtractionError::PatternMismatch {
                pattern: StampPattern::Declassification,
                text: declassification_line.to_string(),
            }
        })?;

        let nnd = extract_nnd(nnd_line).ok_or_else(|| ExtractionError::PatternMismatch {
            pattern: StampPattern::Nnd,
            text: nnd_line.to_string(),
        })?;

        let metadata = DocumentMetadata {
            executive_order: declassification.executive_order,
            section: declassification.section,
            project_number: nnd.project_number,
            author: nnd.author,
            project_year: nnd.project_date,
        };

        if let Some(index) = metadata.as_row().iter().position(|v| v.is_empty()) {
            return Err(ExtractionError::EmptyField(FIELD_NAMES[index]));
        }

        debug!(
            "Extracted stamp: order {} section {} project {}",
            metadata.executive_order, metadata.section, metadata.project_number
        );

        Ok(metadata)
    }
}

impl StampExtractor for StampParser {
    fn extract(&self, ocr_result: &OcrResult) -> Result<DocumentMetadata> {
        match (ocr_result.line(0), ocr_result.line(1)) {
            (Some(first), Some(second)) => self.parse(first, second),
            _ => Err(ExtractionError::InsufficientRegions {
                found: ocr_result.boxes.len(),
                required: STAMP_LINES,
            }),
        }
    }

    fn extract_from_lines(&self, lines: &[&str]) -> Result<DocumentMetadata> {
        match lines {
            [first, second, ..] => self.parse(first, second),
            _ => Err(ExtractionError::InsufficientRegions {
                found: lines.len(),
                required: STAMP_LINES,
            }),
        }
    }
}
