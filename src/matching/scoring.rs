use serde::{Deserialize, Serialize};

use crate::core::entry::BibliographicEntry;
use crate::core::record::SourceRecord;
use crate::matching::similarity::{partial_ratio, token_sort_ratio};

/// Source name reported for a comparison against "no record"
pub const NO_SOURCE: &str = "none";

/// Default partial-ratio score at which two author names are the same person
pub const DEFAULT_AUTHOR_THRESHOLD: u8 = 75;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Minimum partial ratio (0-100) for an author pair to count as a match.
    /// Values between 60 and 80 are typical.
    pub author_threshold: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            author_threshold: DEFAULT_AUTHOR_THRESHOLD,
        }
    }
}

/// How well one registry's record agrees with an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Registry name, or `"none"` if the registry had no record
    pub source_name: String,

    /// Token-sort similarity of the titles (0-100)
    pub title_score: u8,

    /// Whether any claimed author matched any registry author
    pub author_match: bool,

    /// Registry authors that matched a claimed author, in registry order
    pub matched_authors: Vec<String>,
}

impl ComparisonResult {
    /// Comparison against a source that returned nothing
    pub fn empty() -> Self {
        Self {
            source_name: NO_SOURCE.to_string(),
            title_score: 0,
            author_match: false,
            matched_authors: Vec::new(),
        }
    }
}

/// Compares an entry's claims against one registry record.
///
/// Scoring is pure: the same entry and record always give the same result.
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    config: ScoringConfig,
}

impl SimilarityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    #[must_use]
    pub fn score(&self, entry: &BibliographicEntry, record: Option<&SourceRecord>) -> ComparisonResult {
        let Some(record) = record else {
            return ComparisonResult::empty();
        };

        let title_score = token_sort_ratio(&entry.title, &record.title);

        let matched_authors: Vec<String> = record
            .authors
            .iter()
            .filter(|candidate| {
                entry
                    .authors
                    .iter()
                    .any(|claimed| partial_ratio(claimed, candidate) >= self.config.author_threshold)
            })
            .cloned()
            .collect();

        ComparisonResult {
            source_name: record.source_name.clone(),
            title_score,
            author_match: !matched_authors.is_empty(),
            matched_authors,
        }
    }
}
