//! "NND Project Number: ... By: ... NND Date: ..." line.

use super::patterns::NND;
use super::capture;

/// Project number, reviewer and date from the second stamp line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NndStamp {
    pub project_number: String,
    pub author: String,
    pub project_date: String,
}

/// Extract the project number, author and date from a line.
pub fn extract_nnd(text: &str) -> Option<NndStamp> {
    NND.captures(text).map(|caps| NndStamp {
        project_number: capture(&caps, 1),
        author: capture(&caps, 2),
        project_date: capture(&caps, 3),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_line() {
        let found =
            extract_nnd("NND Project Number: 2021-045 By: J. Smith NND Date: 2019").unwrap();
        assert_eq!(found.project_number, "2021-045");
        assert_eq!(found.author, "J. Smith");
        assert_eq!(found.project_date, "2019");
    }

    #[test]
    fn test_tight_spacing() {
        let found = extract_nnd("nnd project number:NND979520 by:NARA NND Date:1998").unwrap();
        assert_eq!(found.project_number, "NND979520");
        assert_eq!(found.author, "NARA");
        assert_eq!(found.project_date, "1998");
    }

    #[test]
    fn test_missing_date_label() {
        assert!(extract_nnd("NND Project Number: 2021-045 By: J. Smith").is_none());
    }

    #[test]
    fn test_only_first_line_is_read() {
        let text = "NND Project Number: 1 By: A NND Date: 2001\n\
                    NND Project Number: 2 By: B NND Date: 2002";
        let found = extract_nnd(text).unwrap();
        assert_eq!(found.project_number, "1");
        assert_eq!(found.author, "A");
        assert_eq!(found.project_date, "2001");
    }
}
