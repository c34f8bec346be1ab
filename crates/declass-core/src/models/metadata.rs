//! Metadata stamped on declassified documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Column names of the metadata row, in row order.
pub const FIELD_NAMES: [&str; 5] = [
    "EXECUTIVE_ORDER",
    "SECTION",
    "PROJECT_NUMBER",
    "AUTHOR",
    "PROJECT_YEAR",
];

/// The five fields read from a declassification stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Executive order the document was declassified under (e.g. "13526").
    pub executive_order: String,

    /// Section of the executive order (e.g. "3.3").
    pub section: String,

    /// NND project number.
    pub project_number: String,

    /// Reviewer named after "By:".
    pub author: String,

    /// NND date, usually just a year.
    pub project_year: String,
}

impl DocumentMetadata {
    /// Fields in fixed row order: order, section, project number, author, year.
    pub fn as_row(&self) -> [&str; 5] {
        [
            &self.executive_order,
            &self.section,
            &self.project_number,
            &self.author,
            &self.project_year,
        ]
    }

    /// Consume into the fixed-order row.
    pub fn into_row(self) -> [String; 5] {
        [
            self.executive_order,
            self.section,
            self.project_number,
            self.author,
            self.project_year,
        ]
    }

    /// Field values with double quotes removed, for display.
    pub fn display_row(&self) -> [String; 5] {
        self.as_row().map(|value| value.replace('"', ""))
    }
}

/// An uploaded document together with its extracted metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    /// Generated identifier, `img_<uuid>`.
    pub image_id: String,

    /// Name of the uploaded file.
    pub file_name: String,

    /// Extracted stamp fields.
    pub metadata: DocumentMetadata,

    /// When processing finished.
    pub processed_at: DateTime<Utc>,

    /// Wall-clock processing time in milliseconds.
    pub duration_ms: u64,
}

/// Generate a fresh image identifier.
pub fn new_image_id() -> String {
    format!("img_{}", Uuid::new_v4())
}
