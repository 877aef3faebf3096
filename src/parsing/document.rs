use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use zip::ZipArchive;

use crate::parsing::ParseError;

/// Body part of a word-processing document inside the .docx container
const DOCUMENT_PART: &str = "word/document.xml";

/// Upper bound on the decompressed document part (zip bomb protection)
const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

/// Supported reading list formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Plain UTF-8 text, one citation per line
    Text,
    /// Office Open XML word-processing document, one citation per paragraph
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a file name's extension (case-insensitive)
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".txt") {
            Some(Self::Text)
        } else if lower.ends_with(".docx") {
            Some(Self::Docx)
        } else {
            None
        }
    }
}

/// Read a reading list file and return its non-empty, trimmed lines.
///
/// # Errors
///
/// Returns `ParseError::UnsupportedFormat` for extensions other than `.txt`
/// and `.docx`, `ParseError::Io` if the file cannot be read, or a decoding
/// error if the content is not valid for its format.
pub fn load_lines(path: &Path) -> Result<Vec<String>, ParseError> {
    let name = path.to_string_lossy();
    let format = DocumentFormat::from_filename(&name)
        .ok_or_else(|| ParseError::UnsupportedFormat(name.to_string()))?;

    let bytes = std::fs::read(path)?;
    lines_from_bytes(bytes, format)
}

/// Extract non-empty, trimmed lines from in-memory document content
///
/// # Errors
///
/// Returns `ParseError::InvalidEncoding` for text that is not UTF-8, or
/// `ParseError::Docx` if a .docx container or its XML cannot be read.
pub fn lines_from_bytes(bytes: Vec<u8>, format: DocumentFormat) -> Result<Vec<String>, ParseError> {
    match format {
        DocumentFormat::Text => Ok(text_lines(&String::from_utf8(bytes)?)),
        DocumentFormat::Docx => docx_paragraphs(&bytes),
    }
}

pub fn text_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Paragraph texts of a .docx document, in document order
///
/// # Errors
///
/// Returns `ParseError::Docx` if the bytes are not a ZIP container with a
/// readable `word/document.xml` part.
pub fn docx_paragraphs(bytes: &[u8]) -> Result<Vec<String>, ParseError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let part = archive.by_name(DOCUMENT_PART)?;

    let mut xml = String::new();
    part.take(MAX_DOCUMENT_XML_BYTES).read_to_string(&mut xml)?;

    paragraphs_from_xml(&xml)
}

fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ParseError> {
    let mut reader = Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"w:p" => current.clear(),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push(' '),
                _ => {}
            },
            Event::Text(e) if in_text => current.push_str(&e.unescape()?),
            Event::End(ref e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let text = current.trim();
                    if !text.is_empty() {
                        paragraphs.push(text.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
