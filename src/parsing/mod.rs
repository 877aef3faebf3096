//! Reading lists in, bibliographic entries out.
//!
//! - [`document`]: extracts non-empty lines from `.txt` files and non-empty
//!   paragraphs from `.docx` files
//! - [`citation`]: turns citation lines into [`BibliographicEntry`] values
//!
//! ## Citation line format
//!
//! ```text
//! Müller und Schmidt (Hrsg.), Basel, Geschichte der Stadt, 2001 [ISBN: 3-7965-1914-4]
//! Smith & Jones, Journal, Sample Title, 2020 [DOI: 10.1000/xyz123]
//! ```
//!
//! | Part | Taken from |
//! |------|------------|
//! | Identifier | `[DOI: …]` or `[ISBN: …]` tag anywhere in the line |
//! | Authors | first comma-separated field, split on ` und `, ` u. `, ` & ` |
//! | Title | third comma-separated field |
//!
//! Fields are split on every comma, so an author written as "Family, Given"
//! shifts the title. Lines without an identifier tag are skipped.
//!
//! [`BibliographicEntry`]: crate::core::entry::BibliographicEntry

use thiserror::Error;

pub mod citation;
pub mod document;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file format: {0} (expected .txt or .docx)")]
    UnsupportedFormat(String),

    #[error("Text is not valid UTF-8")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    #[error("Cannot read .docx document: {0}")]
    Docx(String),

    #[error("Too many entries: {0} exceeds maximum allowed ({max})", max = crate::utils::validation::MAX_ENTRIES)]
    TooManyEntries(usize),
}

impl From<zip::result::ZipError> for ParseError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Docx(e.to_string())
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Docx(e.to_string())
    }
}
