//! Rule-based extractors for the two stamp lines.

pub mod declassification;
pub mod nnd;
pub mod patterns;

pub use declassification::{extract_declassification, Declassification};
pub use nnd::{extract_nnd, NndStamp};
pub use patterns::*;

/// Trimmed text of capture group `index`.
pub(crate) fn capture(caps: &regex::Captures<'_>, index: usize) -> String {
    caps.get(index)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
