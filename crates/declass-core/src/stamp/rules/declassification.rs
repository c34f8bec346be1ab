//! "Declassified per Executive Order ..., Section ..." line.

use super::patterns::DECLASSIFICATION;
use super::capture;

/// Executive order and section from the first stamp line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declassification {
    pub executive_order: String,
    pub section: String,
}

/// Extract the executive order and section from a line.
pub fn extract_declassification(text: &str) -> Option<Declassification> {
    DECLASSIFICATION.captures(text).map(|caps| Declassification {
        executive_order: capture(&caps, 1),
        section: capture(&caps, 2),
    })
}
