//! # cite-check
//!
//! A library for checking bibliography entries against public metadata
//! registries.
//!
//! Reading lists often carry DOIs and ISBNs that were copied by hand. A typo
//! in the identifier, or a title that belongs to a different edition, is easy
//! to miss and hard to spot by eye.
//!
//! `cite-check` looks every identifier up in several registries at once and
//! compares what they return with the claimed title and authors.
//!
//! ## Features
//!
//! - **Identifier normalization**: DOI prefix/case cleanup, ISBN-10 and
//!   ISBN-13 variants with check digits
//! - **Concurrent retrieval**: every registry and identifier variant queried
//!   at once, each call bounded by a timeout
//! - **Title fallback**: ISBN entries nobody knows are searched by title
//! - **Fuzzy comparison**: token-sort title similarity, partial author
//!   similarity
//! - **Verdicts**: `MATCH`, `PARTIAL` or `NO MATCH` with the best registry
//!
//! ## Example
//!
//! ```rust,no_run
//! use cite_check::parsing::citation::parse_line;
//! use cite_check::matching::{Reconciler, ReconcilerConfig};
//! use cite_check::sources::http::{build_client, DEFAULT_CALL_TIMEOUT};
//! use cite_check::SourceRegistry;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let entry = parse_line("Smith, Journal, Sample Title, 2020 [DOI: 10.1000/xyz123]")
//!     .expect("line carries a DOI tag");
//!
//! let client = build_client(DEFAULT_CALL_TIMEOUT)?;
//! let reconciler = Reconciler::new(
//!     SourceRegistry::with_default_sources(&client),
//!     ReconcilerConfig::default(),
//! );
//!
//! let report = reconciler.check(&entry).await?;
//! for (source, comparison, _) in report.source_rows() {
//!     println!("{source}: {}", comparison.title_score);
//! }
//! println!("{}", report.verdict.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Entries, identifiers, registry records
//! - [`sources`]: Registry adapters and the source registry
//! - [`retrieval`]: Concurrent fan-out over the registries
//! - [`matching`]: Similarity scoring, classification, reconciliation
//! - [`parsing`]: Reading list ingestion (.txt, .docx)
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: Web server for browser-based checks

pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod retrieval;
pub mod sources;
pub mod utils;
pub mod web;

// Re-export commonly used types for convenience
pub use core::entry::BibliographicEntry;
pub use core::identifier::{normalize, IdentifierError, NormalizedIdentifier};
pub use core::record::SourceRecord;
pub use core::types::*;
pub use matching::engine::{EntryReport, Reconciler, ReconcilerConfig};
pub use sources::registry::SourceRegistry;
pub use sources::SourceAdapter;
