use serde::{Deserialize, Serialize};

use crate::core::identifier::{normalize, IdentifierError, NormalizedIdentifier};
use crate::core::types::IdentifierKind;

/// A citation from a reading list, as claimed by its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographicEntry {
    /// DOI or ISBN
    pub kind: IdentifierKind,

    /// Identifier as written in the citation
    pub raw_identifier: String,

    /// Claimed title (empty when the citation line had none)
    pub title: String,

    /// Claimed authors, in citation order
    pub authors: Vec<String>,
}

impl BibliographicEntry {
    pub fn new(
        kind: IdentifierKind,
        raw_identifier: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            raw_identifier: raw_identifier.into(),
            title: title.into(),
            authors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a title is available for title-based fallback searches
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Normalize this entry's identifier into its lookup variants
    ///
    /// # Errors
    ///
    /// Returns `IdentifierError::InvalidIdentifier` if the raw identifier does not
    /// have the shape of its declared kind.
    pub fn identifier(&self) -> Result<NormalizedIdentifier, IdentifierError> {
        normalize(&self.raw_identifier, self.kind)
    }
}

/// Normalize a personal name to "Given Family" order.
///
/// Names written as "Family, Given" are flipped; anything else is only trimmed.
pub fn normalize_author(name: &str) -> String {
    let name = name.trim();
    if let Some((family, given)) = name.split_once(',') {
        let family = family.trim();
        let given = given.trim();
        return format!("{given} {family}").trim().to_string();
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_author() {
        assert_eq!(normalize_author("Müller, Hans"), "Hans Müller");
        assert_eq!(normalize_author("  Hans Müller "), "Hans Müller");
        assert_eq!(normalize_author("Smith"), "Smith");
        assert_eq!(normalize_author("Smith,"), "Smith");
        // Only the first comma separates family from given
        assert_eq!(normalize_author("Doe, John, Jr."), "John, Jr. Doe");
    }

    #[test]
    fn test_has_title() {
        let entry = BibliographicEntry::new(IdentifierKind::Doi, "10.1000/x", "  ");
        assert!(!entry.has_title());

        let entry = BibliographicEntry::new(IdentifierKind::Doi, "10.1000/x", "Sample Title");
        assert!(entry.has_title());
    }

    #[test]
    fn test_with_authors() {
        let entry = BibliographicEntry::new(IdentifierKind::Isbn, "3796519144", "Titel")
            .with_authors(["Smith", "Jones"]);
        assert_eq!(entry.authors, vec!["Smith".to_string(), "Jones".to_string()]);
    }
}
