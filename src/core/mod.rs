//! Core data types for citation reconciliation.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`BibliographicEntry`](entry::BibliographicEntry): a citation as claimed in a reading list
//! - [`NormalizedIdentifier`](identifier::NormalizedIdentifier): canonical DOI/ISBN plus lookup variants
//! - [`SourceRecord`](record::SourceRecord): what one registry reported for an identifier
//! - [`IdentifierKind`](types::IdentifierKind), [`MatchStatus`](types::MatchStatus): classification enums
//!
//! ## ISBN Variants
//!
//! Registries disagree on which ISBN form they index, so one ISBN is looked up
//! under several spellings:
//!
//! | Input | Variants |
//! |-------|----------|
//! | `3-7965-1914-4` | `3796519144`, `9783796519147`, `3796519148`, `379651914` |
//! | `978-3-7965-1914-7` | `9783796519147`, `3796519148`, `379651914` |
//! | `979-10-323-0569-0` | `9791032305690` |
//!
//! DOIs are case-insensitive at every registry but echoed in their original
//! casing, so they are only trimmed.

pub mod entry;
pub mod identifier;
pub mod record;
pub mod types;
