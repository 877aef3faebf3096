use serde::{Deserialize, Serialize};

/// Metadata one registry reported for one identifier.
///
/// Only complete records exist: an adapter that cannot fill in the title
/// reports no record at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Display name of the registry that produced the record
    pub source_name: String,

    pub title: String,

    /// Author names as the registry reports them
    pub authors: Vec<String>,
}

impl SourceRecord {
    pub fn new(source_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
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
}
