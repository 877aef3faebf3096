use serde::{Deserialize, Serialize};

use crate::core::entry::BibliographicEntry;
use crate::core::types::MatchStatus;
use crate::matching::scoring::{ComparisonResult, NO_SOURCE};

/// Default title score at which a title counts as confirmed
pub const DEFAULT_TITLE_THRESHOLD: u8 = 85;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum title score (0-100) for the title signal
    pub title_threshold: u8,

    /// Points added to a comparison's title score when ranking it, if an
    /// author matched. Affects only which source is picked, never the
    /// reported score or status.
    #[serde(default)]
    pub author_match_bonus: u8,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            title_threshold: DEFAULT_TITLE_THRESHOLD,
            author_match_bonus: 0,
        }
    }
}

/// Final judgment on one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateVerdict {
    pub title: String,
    pub authors: Vec<String>,

    /// Source of the best comparison, or `"none"`
    pub best_source: String,
    pub best_score: u8,
    pub author_found: bool,
    pub matched_authors: Vec<String>,
    pub status: MatchStatus,
}

/// Reduces per-source comparisons to a single verdict
#[derive(Debug, Clone, Default)]
pub struct MatchClassifier {
    config: ClassifierConfig,
}

impl MatchClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Pick the best comparison by `(title_score, author_match)` and grade it.
    ///
    /// Ties keep the earliest comparison. An empty slice yields `NoMatch`.
    /// Classification cannot fail.
    #[must_use]
    pub fn classify(
        &self,
        entry: &BibliographicEntry,
        comparisons: &[ComparisonResult],
    ) -> AggregateVerdict {
        let mut best: Option<&ComparisonResult> = None;
        for comparison in comparisons {
            let better = best.map_or(true, |current| {
                self.rank_key(comparison) > self.rank_key(current)
            });
            if better {
                best = Some(comparison);
            }
        }

        let Some(best) = best else {
            return AggregateVerdict {
                title: entry.title.clone(),
                authors: entry.authors.clone(),
                best_source: NO_SOURCE.to_string(),
                best_score: 0,
                author_found: false,
                matched_authors: Vec::new(),
                status: MatchStatus::NoMatch,
            };
        };

        let title_ok = best.title_score >= self.config.title_threshold;
        AggregateVerdict {
            title: entry.title.clone(),
            authors: entry.authors.clone(),
            best_source: best.source_name.clone(),
            best_score: best.title_score,
            author_found: best.author_match,
            matched_authors: best.matched_authors.clone(),
            status: MatchStatus::from_signals(title_ok, best.author_match),
        }
    }

    fn rank_key(&self, comparison: &ComparisonResult) -> (u8, bool) {
        let bonus = if comparison.author_match {
            self.config.author_match_bonus
        } else {
            0
        };
        (
            comparison.title_score.saturating_add(bonus).min(100),
            comparison.author_match,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::IdentifierKind;

    fn entry() -> BibliographicEntry {
        BibliographicEntry::new(IdentifierKind::Doi, "10.1000/xyz123", "Sample Title")
            .with_authors(["Smith"])
    }

    fn comparison(source: &str, title_score: u8, author_match: bool) -> ComparisonResult {
        ComparisonResult {
            source_name: source.to_string(),
            title_score,
            author_match,
            matched_authors: if author_match {
                vec!["Smith".to_string()]
            } else {
                Vec::new()
            },
        }
    }

    #[test]
    fn test_empty_is_no_match() {
        let verdict = MatchClassifier::default().classify(&entry(), &[]);
        assert_eq!(verdict.best_source, "none");
        assert_eq!(verdict.best_score, 0);
        assert!(!verdict.author_found);
        assert_eq!(verdict.status, MatchStatus::NoMatch);
        assert_eq!(verdict.title, "Sample Title");
    }

    #[test]
    fn test_best_by_score_then_author() {
        let comparisons = [
            comparison("A", 90, false),
            comparison("B", 95, false),
            comparison("C", 95, true),
            comparison("D", 80, true),
        ];
        let verdict = MatchClassifier::default().classify(&entry(), &comparisons);
        assert_eq!(verdict.best_source, "C");
        assert_eq!(verdict.status, MatchStatus::Match);
    }

    #[test]
    fn test_tie_keeps_first() {
        let comparisons = [comparison("First", 70, true), comparison("Second", 70, true)];
        let verdict = MatchClassifier::default().classify(&entry(), &comparisons);
        assert_eq!(verdict.best_source, "First");
    }

    #[test]
    fn test_status_thresholds() {
        let classifier = MatchClassifier::default();

        let verdict = classifier.classify(&entry(), &[comparison("A", 85, true)]);
        assert_eq!(verdict.status, MatchStatus::Match);

        let verdict = classifier.classify(&entry(), &[comparison("A", 100, false)]);
        assert_eq!(verdict.status, MatchStatus::PartialMatch);

        let verdict = classifier.classify(&entry(), &[comparison("A", 84, true)]);
        assert_eq!(verdict.status, MatchStatus::PartialMatch);

        let verdict = classifier.classify(&entry(), &[comparison("A", 84, false)]);
        assert_eq!(verdict.status, MatchStatus::NoMatch);
    }

    #[test]
    fn test_title_threshold_configurable() {
        let classifier = MatchClassifier::new(ClassifierConfig {
            title_threshold: 70,
            ..ClassifierConfig::default()
        });
        let verdict = classifier.classify(&entry(), &[comparison("A", 75, true)]);
        assert_eq!(verdict.status, MatchStatus::Match);
    }

    #[test]
    fn test_author_bonus_changes_ranking_only() {
        let comparisons = [comparison("Title", 92, false), comparison("Author", 88, true)];

        let plain = MatchClassifier::default().classify(&entry(), &comparisons);
        assert_eq!(plain.best_source, "Title");
        assert_eq!(plain.status, MatchStatus::PartialMatch);

        let with_bonus = MatchClassifier::new(ClassifierConfig {
            author_match_bonus: 10,
            ..ClassifierConfig::default()
        })
        .classify(&entry(), &comparisons);
        assert_eq!(with_bonus.best_source, "Author");
        assert_eq!(with_bonus.best_score, 88);
        assert_eq!(with_bonus.status, MatchStatus::Match);
    }

    #[test]
    fn test_all_none_comparisons() {
        let comparisons = [ComparisonResult::empty(), ComparisonResult::empty()];
        let verdict = MatchClassifier::default().classify(&entry(), &comparisons);
        assert_eq!(verdict.best_source, "none");
        assert_eq!(verdict.best_score, 0);
        assert_eq!(verdict.status, MatchStatus::NoMatch);
    }
}
