use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::core::entry::{normalize_author, BibliographicEntry};
use crate::core::types::IdentifierKind;
use crate::parsing::document::{lines_from_bytes, load_lines, DocumentFormat};
use crate::parsing::ParseError;
use crate::utils::validation::check_entry_limit;

lazy_static! {
    static ref DOI_TAG: Regex =
        Regex::new(r"\[DOI:\s*(10\.\S+?)\]").expect("DOI tag pattern is valid");
    static ref ISBN_TAG: Regex =
        Regex::new(r"\[ISBN:\s*([\dXx\-]+)\]").expect("ISBN tag pattern is valid");
    static ref EDITOR_MARK: Regex = Regex::new(r"\(Hrsg\.\)").expect("editor pattern is valid");
    static ref AUTHOR_SEPARATOR: Regex =
        Regex::new(r" und | u\. | & ").expect("separator pattern is valid");
}

/// Entries recognized in a reading list
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedDocument {
    pub entries: Vec<BibliographicEntry>,

    /// Lines that carried no DOI or ISBN tag
    pub skipped_lines: usize,
}

/// Parse one citation line.
///
/// Returns `None` if the line has no `[DOI: …]` or `[ISBN: …]` tag. A DOI
/// tag wins when both are present. Tags are removed before the line is split
/// into fields.
pub fn parse_line(line: &str) -> Option<BibliographicEntry> {
    let (kind, identifier) = if let Some(caps) = DOI_TAG.captures(line) {
        (IdentifierKind::Doi, caps[1].trim().to_string())
    } else if let Some(caps) = ISBN_TAG.captures(line) {
        (IdentifierKind::Isbn, caps[1].trim().to_string())
    } else {
        return None;
    };

    let without_doi = DOI_TAG.replace_all(line, "");
    let body = ISBN_TAG.replace_all(&without_doi, "");
    let fields: Vec<&str> = body.split(',').collect();
    let title = fields.get(2).map(|t| t.trim()).unwrap_or_default();

    Some(BibliographicEntry::new(kind, identifier, title).with_authors(parse_authors(fields[0])))
}

/// Split the author field into individual names in "Given Family" order
fn parse_authors(field: &str) -> Vec<String> {
    let cleaned = EDITOR_MARK.replace_all(field, "");
    let cleaned = cleaned.replace("et al.", "").replace("et al", "");

    AUTHOR_SEPARATOR
        .split(&cleaned)
        .map(normalize_author)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Parse citation lines, skipping lines without an identifier tag.
///
/// # Errors
///
/// Returns `ParseError::TooManyEntries` if more than the allowed number of
/// entries are found.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Result<ParsedDocument, ParseError> {
    let mut parsed = ParsedDocument::default();

    for line in lines {
        match parse_line(line.as_ref()) {
            Some(entry) => {
                if check_entry_limit(parsed.entries.len()).is_some() {
                    return Err(ParseError::TooManyEntries(parsed.entries.len() + 1));
                }
                parsed.entries.push(entry);
            }
            None => {
                debug!(line = line.as_ref(), "No identifier tag, skipping line");
                parsed.skipped_lines += 1;
            }
        }
    }

    Ok(parsed)
}

/// Load a `.txt` or `.docx` reading list from disk and parse it
///
/// # Errors
///
/// Returns a `ParseError` if the file cannot be read or decoded, or holds too
/// many entries.
pub fn parse_file(path: &Path) -> Result<ParsedDocument, ParseError> {
    let lines = load_lines(path)?;
    parse_lines(&lines)
}

/// Parse an uploaded reading list already held in memory
///
/// # Errors
///
/// Returns a `ParseError` if the content cannot be decoded or holds too many
/// entries.
pub fn parse_bytes(bytes: Vec<u8>, format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    let lines = lines_from_bytes(bytes, format)?;
    parse_lines(&lines)
}
