use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::entry::BibliographicEntry;
use crate::core::identifier::{IdentifierError, NormalizedIdentifier};
use crate::core::record::SourceRecord;
use crate::matching::classifier::{AggregateVerdict, ClassifierConfig, MatchClassifier};
use crate::matching::scoring::{ComparisonResult, ScoringConfig, SimilarityScorer};
use crate::retrieval::{
    RetrievalConfig, RetrievalOrchestrator, RetrievalOutcome, RetrievalStrategy, SourceLimits,
};
use crate::sources::registry::SourceRegistry;

/// Default number of entries reconciled at the same time
pub const DEFAULT_MAX_CONCURRENT_ENTRIES: usize = 4;

/// Configuration for a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    pub retrieval: RetrievalConfig,
    pub scoring: ScoringConfig,
    pub classifier: ClassifierConfig,

    /// Entries in flight at once; results keep input order regardless
    pub max_concurrent_entries: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            scoring: ScoringConfig::default(),
            classifier: ClassifierConfig::default(),
            max_concurrent_entries: DEFAULT_MAX_CONCURRENT_ENTRIES,
        }
    }
}

/// Everything learned about one entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryReport {
    pub entry: BibliographicEntry,
    pub identifier: NormalizedIdentifier,

    /// Queried sources, in submission order
    pub attempted: Vec<String>,

    /// One comparison per attempted source, aligned with `attempted`
    pub comparisons: Vec<ComparisonResult>,

    pub records: Vec<SourceRecord>,
    pub strategy: Option<RetrievalStrategy>,
    pub verdict: AggregateVerdict,
}

impl EntryReport {
    /// Per-source rows: source name, its comparison, and the record it returned
    pub fn source_rows(&self) -> impl Iterator<Item = (&str, &ComparisonResult, Option<&SourceRecord>)> {
        self.attempted
            .iter()
            .zip(&self.comparisons)
            .map(|(source, comparison)| {
                let record = self.records.iter().find(|r| &r.source_name == source);
                (source.as_str(), comparison, record)
            })
    }
}

/// Runs entries through normalize, retrieve, score and classify
pub struct Reconciler {
    orchestrator: RetrievalOrchestrator,
    scorer: SimilarityScorer,
    classifier: MatchClassifier,
    max_concurrent_entries: usize,
}

impl Reconciler {
    pub fn new(registry: SourceRegistry, config: ReconcilerConfig) -> Self {
        let limits = SourceLimits::new(&registry, config.retrieval.max_concurrent_per_source);
        Self::with_limits(registry, config, limits)
    }

    /// Build a reconciler whose registry calls count against shared limits
    pub fn with_limits(registry: SourceRegistry, config: ReconcilerConfig, limits: SourceLimits) -> Self {
        Self {
            orchestrator: RetrievalOrchestrator::with_limits(registry, config.retrieval, limits),
            scorer: SimilarityScorer::new(config.scoring),
            classifier: MatchClassifier::new(config.classifier),
            max_concurrent_entries: config.max_concurrent_entries.max(1),
        }
    }

    pub fn orchestrator(&self) -> &RetrievalOrchestrator {
        &self.orchestrator
    }

    /// Reconcile one entry.
    ///
    /// # Errors
    ///
    /// Returns `IdentifierError::InvalidIdentifier` if the entry's identifier
    /// cannot be normalized. Registry failures are never errors.
    pub async fn check(&self, entry: &BibliographicEntry) -> Result<EntryReport, IdentifierError> {
        let identifier = entry.identifier()?;
        let outcome = self.orchestrator.retrieve(entry, &identifier).await;
        let report = self.evaluate(entry, identifier, outcome);

        info!(
            identifier = %report.identifier.canonical,
            status = %report.verdict.status,
            best_source = %report.verdict.best_source,
            best_score = report.verdict.best_score,
            "Entry reconciled"
        );
        Ok(report)
    }

    /// Reconcile many entries with bounded concurrency.
    ///
    /// The result at index `i` belongs to `entries[i]`, however fast each
    /// registry answered. An invalid entry does not stop the others.
    pub async fn check_all(
        &self,
        entries: &[BibliographicEntry],
    ) -> Vec<Result<EntryReport, IdentifierError>> {
        let checks: Vec<_> = entries.iter().map(|entry| self.check_logged(entry)).collect();
        stream::iter(checks)
            .buffered(self.max_concurrent_entries)
            .collect()
            .await
    }

    async fn check_logged(&self, entry: &BibliographicEntry) -> Result<EntryReport, IdentifierError> {
        let result = self.check(entry).await;
        if let Err(e) = &result {
            warn!(error = %e, "Skipping entry");
        }
        result
    }

    /// Score and classify already retrieved records. Performs no I/O.
    pub fn evaluate(
        &self,
        entry: &BibliographicEntry,
        identifier: NormalizedIdentifier,
        outcome: RetrievalOutcome,
    ) -> EntryReport {
        let comparisons: Vec<ComparisonResult> = outcome
            .attempted
            .iter()
            .map(|source| self.scorer.score(entry, outcome.record_from(source)))
            .collect();

        let verdict = self.classifier.classify(entry, &comparisons);

        EntryReport {
            entry: entry.clone(),
            identifier,
            attempted: outcome.attempted,
            comparisons,
            records: outcome.records,
            strategy: outcome.strategy,
            verdict,
        }
    }
}
