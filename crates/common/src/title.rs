// Section/template title normalization: NFKC, whitespace collapse, 512 char max.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum allowed title length in characters.
const MAX_TITLE_CHARS: usize = 512;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TitleError {
    #[error("title is empty")]
    Empty,

    #[error("title exceeds maximum length of {MAX_TITLE_CHARS} characters")]
    TooLong,

    #[error("title contains control character")]
    ControlChar,
}

/// Normalize a title before storage.
///
/// Rules:
/// - Apply Unicode NFKC normalization
/// - Collapse internal whitespace runs into a single space
/// - Strip leading and trailing whitespace
/// - Reject control characters (including tabs and newlines embedded
///   after collapsing — only plain spaces survive)
/// - Reject empty titles
/// - Enforce max 512 character limit (after normalization)
pub fn normalize_title(input: &str) -> Result<String, TitleError> {
    if input.chars().any(|ch| ch.is_control() && !ch.is_whitespace()) {
        return Err(TitleError::ControlChar);
    }

    // Apply Unicode NFKC normalization
    let normalized: String = input.nfkc().collect();

    // Collapse whitespace runs and trim the ends
    let collapsed = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return Err(TitleError::Empty);
    }

    if collapsed.chars().count() > MAX_TITLE_CHARS {
        return Err(TitleError::TooLong);
    }

    Ok(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_title() {
        assert_eq!(normalize_title("Adverse Events").unwrap(), "Adverse Events");
    }

    #[test]
    fn test_trims_and_collapses_whitespace() {
        assert_eq!(
            normalize_title("  Study   Design \n Overview ").unwrap(),
            "Study Design Overview"
        );
    }

    #[test]
    fn test_unicode_nfkc() {
        // NFKC normalizes ﬁ (U+FB01, fi ligature) to "fi"
        assert_eq!(normalize_title("E\u{FB01}cacy").unwrap(), "Eficacy");
    }

    #[test]
    fn test_unicode_combining() {
        let composed = normalize_title("Caf\u{0065}\u{0301}").unwrap();
        let expected = normalize_title("Café").unwrap();
        assert_eq!(composed, expected);
    }

    #[test]
    fn test_reject_empty() {
        assert_eq!(normalize_title(""), Err(TitleError::Empty));
    }

    #[test]
    fn test_reject_whitespace_only() {
        assert_eq!(normalize_title("   \t\n "), Err(TitleError::Empty));
    }

    #[test]
    fn test_reject_control_char() {
        assert_eq!(normalize_title("Safety\0Summary"), Err(TitleError::ControlChar));
        assert_eq!(normalize_title("Safety\u{1b}[31m"), Err(TitleError::ControlChar));
    }

    #[test]
    fn test_max_length_exactly() {
        let title = "a".repeat(512);
        assert!(normalize_title(&title).is_ok());
    }

    #[test]
    fn test_over_max_length() {
        let title = "a".repeat(513);
        assert_eq!(normalize_title(&title), Err(TitleError::TooLong));
    }

    #[test]
    fn test_numbering_prefix_is_plain_text() {
        // Dotted numbers are derived at read time; a literal "2.3.1" in a
        // title is just text and passes through untouched.
        assert_eq!(normalize_title("2.3.1 Dosing").unwrap(), "2.3.1 Dosing");
    }
}
