//! Reconciliation engine: similarity scoring and verdict classification.
//!
//! - [`Reconciler`]: runs entries through normalize, retrieve, score, classify
//! - [`SimilarityScorer`]: compares an entry with one registry record
//! - [`MatchClassifier`]: reduces per-source comparisons to one verdict
//!
//! ## Scoring
//!
//! - **Title**: token-sort ratio of the claimed and the registry title (0-100)
//! - **Author**: partial ratio of every (claimed, registry) author pair; the
//!   author signal is set when any pair reaches the author threshold
//!
//! ## Classification
//!
//! The comparison with the highest `(title_score, author_match)` wins; ties go
//! to the source submitted first. Its status is:
//!
//! | Title ≥ threshold | Author matched | Status |
//! |-------------------|----------------|--------|
//! | yes | yes | `Match` |
//! | yes | no | `PartialMatch` |
//! | no | yes | `PartialMatch` |
//! | no | no | `NoMatch` |
//!
//! ## Example
//!
//! ```rust,no_run
//! use cite_check::core::entry::BibliographicEntry;
//! use cite_check::core::types::IdentifierKind;
//! use cite_check::matching::{Reconciler, ReconcilerConfig};
//! use cite_check::sources::http::{build_client, DEFAULT_CALL_TIMEOUT};
//! use cite_check::sources::registry::SourceRegistry;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = build_client(DEFAULT_CALL_TIMEOUT)?;
//! let registry = SourceRegistry::with_default_sources(&client);
//! let reconciler = Reconciler::new(registry, ReconcilerConfig::default());
//!
//! let entry = BibliographicEntry::new(IdentifierKind::Doi, "10.1000/xyz123", "Sample Title")
//!     .with_authors(["Smith"]);
//! let report = reconciler.check(&entry).await?;
//! println!("{}: {}", report.verdict.status, report.verdict.best_source);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod engine;
pub mod scoring;
pub mod similarity;

pub use classifier::{AggregateVerdict, ClassifierConfig, MatchClassifier};
pub use engine::{EntryReport, Reconciler, ReconcilerConfig};
pub use scoring::{ComparisonResult, ScoringConfig, SimilarityScorer};
