//! Regex patterns for declassification stamp lines.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "Declassified per Executive Order 13526, Section 3.3"
    pub static ref DECLASSIFICATION: Regex = Regex::new(
        r"(?i)Declassified per Executive Order\s+(.*)\s*,\s*Section\s+(.*)"
    ).unwrap();

    // "NND Project Number: 2021-045 By: J. Smith NND Date: 2019"
    pub static ref NND: Regex = Regex::new(
        r"(?i)NND Project Number:\s*(.*?)\s*By:\s*(.*)NND Date:\s*(.*)"
    ).unwrap();
}
