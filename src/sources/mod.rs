//! External metadata registries.
//!
//! Every registry is wrapped in a [`SourceAdapter`]: one outbound request per
//! identifier, a registry-specific field mapping, and a uniform
//! [`SourceRecord`] back. Adapters never fail: transport errors, bad status
//! codes and unexpected payloads are all absorbed into "no record", so one
//! unreliable registry cannot affect any other.
//!
//! ## Registries
//!
//! | Adapter | Kind | Tier | Title search |
//! |---------|------|------|--------------|
//! | Crossref | DOI | fast | no |
//! | OpenCitations | DOI | fast | no |
//! | DOAJ | DOI | fast | no |
//! | DOI content negotiation | DOI | fast | no |
//! | DataCite | DOI | fast | no |
//! | Open Library | ISBN | fast | yes |
//! | Google Books | ISBN | fast | no |
//! | WorldCat SRU | ISBN | fast | no |
//! | DNB | ISBN | slow | yes |
//! | ZDB | ISBN | slow | yes |
//!
//! The order above is the submission order used for tie-breaking; see
//! [`registry::SourceRegistry`].

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::core::record::SourceRecord;
use crate::core::types::IdentifierKind;

pub mod crossref;
pub mod datacite;
pub mod dnb;
pub mod doaj;
pub mod doi_content;
pub mod google_books;
pub mod http;
pub mod marc;
pub mod openlibrary;
pub mod opencitations;
pub mod registry;
pub mod worldcat;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Registry unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("Registry returned HTTP {0}")]
    Status(u16),

    #[error("Unexpected payload: {0}")]
    Parse(String),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid XML payload: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Payload is missing field '{0}'")]
    MissingField(&'static str),
}

/// What a registry can be asked about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Capabilities {
    pub supports_doi: bool,
    pub supports_isbn: bool,
    /// Accepts free-text title queries
    pub supports_title_search: bool,
    /// Only queried when slow sources are explicitly included
    pub is_slow: bool,
}

impl Capabilities {
    pub const fn doi() -> Self {
        Self {
            supports_doi: true,
            supports_isbn: false,
            supports_title_search: false,
            is_slow: false,
        }
    }

    pub const fn isbn() -> Self {
        Self {
            supports_doi: false,
            supports_isbn: true,
            supports_title_search: false,
            is_slow: false,
        }
    }

    #[must_use]
    pub const fn with_title_search(mut self) -> Self {
        self.supports_title_search = true;
        self
    }

    #[must_use]
    pub const fn slow(mut self) -> Self {
        self.is_slow = true;
        self
    }

    pub fn supports(&self, kind: IdentifierKind) -> bool {
        match kind {
            IdentifierKind::Doi => self.supports_doi,
            IdentifierKind::Isbn => self.supports_isbn,
        }
    }
}

/// One external registry.
///
/// Implementations hold no mutable state and may be called concurrently.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Registry display name, used as `source_name` on records
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Look up one pre-normalized identifier variant
    async fn fetch(&self, identifier: &str) -> Option<SourceRecord>;

    /// Look up a work by title; only called when `supports_title_search` is set
    async fn search_title(&self, _title: &str) -> Option<SourceRecord> {
        None
    }
}

/// Turn an adapter's internal result into "record or nothing", logging the
/// reason a lookup produced nothing.
pub(crate) fn absorb(
    source: &str,
    query: &str,
    result: Result<Option<SourceRecord>, SourceError>,
) -> Option<SourceRecord> {
    match result {
        Ok(Some(record)) => {
            debug!(source, query, title = %record.title, "Registry returned a record");
            Some(record)
        }
        Ok(None) => {
            debug!(source, query, "Registry has no record");
            None
        }
        Err(e) => {
            debug!(source, query, error = %e, "Registry lookup failed");
            None
        }
    }
}

/// Assemble a record from mapped fields, rejecting a missing or blank title
pub(crate) fn build_record(
    source: &str,
    title: Option<String>,
    authors: impl IntoIterator<Item = String>,
) -> Result<SourceRecord, SourceError> {
    let title = title
        .map(|t| collapse_whitespace(&t))
        .filter(|t| !t.is_empty())
        .ok_or(SourceError::MissingField("title"))?;

    let authors = authors
        .into_iter()
        .map(|a| collapse_whitespace(&a))
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>();

    Ok(SourceRecord::new(source, title).with_authors(authors))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_supports() {
        let caps = Capabilities::isbn().with_title_search().slow();
        assert!(caps.supports(IdentifierKind::Isbn));
        assert!(!caps.supports(IdentifierKind::Doi));
        assert!(caps.supports_title_search);
        assert!(caps.is_slow);
    }

    #[test]
    fn test_build_record_rejects_blank_title() {
        let result = build_record("Test", Some("   ".to_string()), Vec::new());
        assert!(matches!(result, Err(SourceError::MissingField("title"))));

        let result = build_record("Test", None, Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_build_record_collapses_whitespace() {
        let record = build_record(
            "Test",
            Some("  A\n  Title ".to_string()),
            vec!["  Smith ".to_string(), String::new()],
        )
        .unwrap();
        assert_eq!(record.title, "A Title");
        assert_eq!(record.authors, vec!["Smith".to_string()]);
    }

    #[test]
    fn test_absorb_swallows_errors() {
        assert!(absorb("Test", "x", Err(SourceError::Status(503))).is_none());
        assert!(absorb("Test", "x", Ok(None)).is_none());

        let record = SourceRecord::new("Test", "Title");
        assert_eq!(absorb("Test", "x", Ok(Some(record.clone()))), Some(record));
    }
}
