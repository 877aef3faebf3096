//! Centralized validation and helper functions.

use crate::parsing::document::DocumentFormat;

/// Maximum number of entries accepted from a single document (DOS protection)
pub const MAX_ENTRIES: usize = 2_000;

/// Security-related constants for input validation
pub const MAX_FILENAME_LENGTH: usize = 255;
pub const MIN_FILE_CONTENT_SIZE: usize = 1;

/// Check whether a string has the shape of a DOI (`10.` prefix, no whitespace).
///
/// # Examples
///
/// ```
/// use cite_check::utils::validation::is_doi_shaped;
///
/// assert!(is_doi_shaped("10.1000/xyz123"));
/// assert!(!is_doi_shaped("10."));
/// assert!(!is_doi_shaped("10.1000/with space"));
/// ```
#[must_use]
pub fn is_doi_shaped(s: &str) -> bool {
    s.len() > 3 && s.starts_with("10.") && !s.chars().any(char::is_whitespace)
}

/// Check whether a string has the shape of an ISBN: digits, hyphens, spaces and
/// `X`, with at least one digit. Length is not checked.
///
/// # Examples
///
/// ```
/// use cite_check::utils::validation::is_isbn_shaped;
///
/// assert!(is_isbn_shaped("3-7965-1914-4"));
/// assert!(is_isbn_shaped("080442957X"));
/// assert!(!is_isbn_shaped("ISBN 3796519144"));
/// assert!(!is_isbn_shaped("--"));
/// ```
#[must_use]
pub fn is_isbn_shaped(s: &str) -> bool {
    let s = s.trim();
    s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | ' ' | 'X' | 'x'))
}

/// Check digit for a 12-digit ISBN-13 body.
///
/// Weights alternate 1,3 starting at position 0; the check digit is
/// `(10 - sum mod 10) mod 10`. Returns `None` unless `body` is exactly 12 digits.
#[must_use]
pub fn isbn13_check_digit(body: &str) -> Option<char> {
    if body.len() != 12 {
        return None;
    }
    let mut sum = 0u32;
    for (i, c) in body.chars().enumerate() {
        let digit = c.to_digit(10)?;
        sum += digit * if i % 2 == 0 { 1 } else { 3 };
    }
    char::from_digit((10 - sum % 10) % 10, 10)
}

/// Check digit for a 9-digit ISBN-10 body (mod 11, `X` for ten).
///
/// Returns `None` unless `body` is exactly 9 digits.
#[must_use]
pub fn isbn10_check_digit(body: &str) -> Option<char> {
    if body.len() != 9 {
        return None;
    }
    let mut sum = 0u32;
    for (i, c) in body.chars().enumerate() {
        let digit = c.to_digit(10)?;
        #[allow(clippy::cast_possible_truncation)] // i < 9
        let weight = 10 - i as u32;
        sum += digit * weight;
    }
    match (11 - sum % 11) % 11 {
        10 => Some('X'),
        check => char::from_digit(check, 10),
    }
}

/// Check if adding another entry would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new entry.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_entry_limit(count: usize) -> Option<String> {
    if count >= MAX_ENTRIES {
        Some(format!(
            "Too many entries: adding another would exceed maximum of {MAX_ENTRIES}"
        ))
    } else {
        None
    }
}

/// Security validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Filename too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,
    #[error("Invalid filename: contains path traversal or invalid characters")]
    InvalidFilename,
    #[error("Empty filename provided")]
    EmptyFilename,
    #[error("File content appears malformed or invalid")]
    InvalidFileContent,
    #[error("File format validation failed")]
    FormatValidationFailed,
}

/// Secure filename validation to prevent directory traversal and other attacks
///
/// Validates and sanitizes filenames by:
/// - Checking length limits
/// - Preventing directory traversal (../, ..\\)
/// - Removing potentially dangerous characters
/// - Ensuring filename is not empty after sanitization
///
/// # Errors
///
/// Returns `ValidationError::EmptyFilename` if the filename is empty,
/// `ValidationError::FilenameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidFilename` if it contains invalid characters.
pub fn validate_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::FilenameTooLong);
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    if filename.contains('\0') || filename.chars().any(|c| ('\x01'..='\x1F').contains(&c)) {
        return Err(ValidationError::InvalidFilename);
    }

    let sanitized = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '_' || *c == ' ')
        .collect::<String>();

    if sanitized.trim().is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    // Hidden files only with a known extension
    if sanitized.starts_with('.') && !has_known_extension(&sanitized) {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}

fn has_known_extension(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    [".txt", ".docx"].iter().any(|ext| lower.ends_with(ext))
}

/// Validate file content against the magic number of its expected format
#[must_use]
pub fn validate_file_format(content: &[u8], expected_format: DocumentFormat) -> bool {
    if content.is_empty() {
        return false;
    }

    match expected_format {
        // .docx is a ZIP container
        DocumentFormat::Docx => content.starts_with(b"PK\x03\x04"),
        DocumentFormat::Text => std::str::from_utf8(content).is_ok(),
    }
}

/// Validate that text content is not binary or malformed
///
/// # Errors
///
/// Returns `ValidationError::InvalidFileContent` if the content is too small,
/// contains unexpected binary data, or fails UTF-8 validation.
pub fn validate_text_content(content: &[u8]) -> Result<(), ValidationError> {
    if content.len() < MIN_FILE_CONTENT_SIZE {
        return Err(ValidationError::InvalidFileContent);
    }

    // Control characters other than tab/newline/carriage return (UTF-8
    // continuation bytes are fine, reading lists are full of umlauts)
    let control_count = content
        .iter()
        .filter(|&&b| b < 9 || (b > 13 && b < 32) || b == 127)
        .count();

    if content.len() > 100 && control_count > content.len() / 20 {
        return Err(ValidationError::InvalidFileContent);
    }

    if std::str::from_utf8(content).is_err() {
        return Err(ValidationError::InvalidFileContent);
    }

    Ok(())
}

/// Comprehensive upload validation combining filename and content checks
///
/// # Errors
///
/// Returns a `ValidationError` if filename validation fails, the content does
/// not match the expected format, or text content is malformed.
pub fn validate_upload(
    filename: Option<&str>,
    content: &[u8],
    expected_format: DocumentFormat,
) -> Result<Option<String>, ValidationError> {
    let validated_filename = if let Some(name) = filename {
        Some(validate_filename(name)?)
    } else {
        None
    };

    if content.len() < MIN_FILE_CONTENT_SIZE {
        return Err(ValidationError::InvalidFileContent);
    }

    if expected_format == DocumentFormat::Text {
        validate_text_content(content)?;
    }

    if !validate_file_format(content, expected_format) {
        return Err(ValidationError::FormatValidationFailed);
    }

    Ok(validated_filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn13_check_digit() {
        assert_eq!(isbn13_check_digit("978379651914"), Some('7'));
        assert_eq!(isbn13_check_digit("978030640615"), Some('7'));
        assert_eq!(isbn13_check_digit("97803064061"), None);
        assert_eq!(isbn13_check_digit("97803064061X"), None);
    }

    #[test]
    fn test_isbn10_check_digit() {
        assert_eq!(isbn10_check_digit("030640615"), Some('2'));
        assert_eq!(isbn10_check_digit("080442957"), Some('X'));
        assert_eq!(isbn10_check_digit("379651914"), Some('8'));
        assert_eq!(isbn10_check_digit("37965191"), None);
    }

    #[test]
    fn test_check_entry_limit() {
        assert!(check_entry_limit(0).is_none());
        assert!(check_entry_limit(MAX_ENTRIES - 1).is_none());
        assert!(check_entry_limit(MAX_ENTRIES).is_some());
    }

    #[test]
    fn test_validate_filename() {
        assert_eq!(validate_filename("liste.txt").unwrap(), "liste.txt");
        assert_eq!(
            validate_filename("Literatur (final).docx").unwrap(),
            "Literatur final.docx"
        );
        assert!(matches!(
            validate_filename("../etc/passwd"),
            Err(ValidationError::InvalidFilename)
        ));
        assert!(matches!(
            validate_filename("   "),
            Err(ValidationError::EmptyFilename)
        ));
        assert!(validate_filename(".hidden").is_err());
        assert!(validate_filename(".liste.txt").is_ok());
    }

    #[test]
    fn test_validate_file_format() {
        assert!(validate_file_format(b"PK\x03\x04rest", DocumentFormat::Docx));
        assert!(!validate_file_format(b"plain text", DocumentFormat::Docx));
        assert!(validate_file_format("Müller, Hans".as_bytes(), DocumentFormat::Text));
        assert!(!validate_file_format(b"", DocumentFormat::Text));
    }

    #[test]
    fn test_validate_text_content_accepts_umlauts() {
        let text = "Müller, Hans, Über die Geschichte, 2001 [ISBN: 3-7965-1914-4]\n".repeat(5);
        assert!(validate_text_content(text.as_bytes()).is_ok());
    }

    #[test]
    fn test_validate_text_content_rejects_binary() {
        let binary = vec![0u8; 512];
        assert!(validate_text_content(&binary).is_err());
    }
}
