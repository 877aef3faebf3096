//! Concurrent record retrieval for one entry.
//!
//! Retrieval runs an ordered list of strategies and stops at the first one
//! that yields any record:
//!
//! 1. [`RetrievalStrategy::IdentifierFanOut`]: every applicable adapter is
//!    called with every identifier variant, all at once.
//! 2. [`RetrievalStrategy::TitleSearch`]: for ISBN entries that carry a
//!    title, adapters with title search are queried by title instead.
//!
//! An empty outcome is not an error; it becomes a `NoMatch` verdict.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::entry::BibliographicEntry;
use crate::core::record::SourceRecord;
use crate::core::types::IdentifierKind;

pub mod orchestrator;

pub use orchestrator::{RetrievalOrchestrator, SourceLimits};

/// Default bound for one registry call
pub const DEFAULT_CALL_TIMEOUT: Duration = crate::sources::http::DEFAULT_CALL_TIMEOUT;

/// Default number of in-flight calls allowed against one registry
pub const DEFAULT_MAX_CONCURRENT_PER_SOURCE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Also query the slow tier of registries
    pub include_slow_sources: bool,

    /// Bound for each individual (adapter, variant) call
    #[serde(with = "duration_secs")]
    pub call_timeout: Duration,

    /// Cap on in-flight calls per registry, across all entries
    pub max_concurrent_per_source: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            include_slow_sources: false,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_concurrent_per_source: DEFAULT_MAX_CONCURRENT_PER_SOURCE,
        }
    }
}

/// One way of finding records, tried in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    IdentifierFanOut,
    TitleSearch,
}

impl RetrievalStrategy {
    pub const ORDERED: [Self; 2] = [Self::IdentifierFanOut, Self::TitleSearch];

    /// Whether this strategy can be used for `entry`
    pub fn applies_to(self, entry: &BibliographicEntry) -> bool {
        match self {
            Self::IdentifierFanOut => true,
            Self::TitleSearch => entry.kind == IdentifierKind::Isbn && entry.has_title(),
        }
    }
}

/// Records found for one entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    /// At most one record per source, in submission order
    pub records: Vec<SourceRecord>,

    /// Every source that was queried, in submission order
    pub attempted: Vec<String>,

    /// Strategy that produced the records, `None` if nothing was found
    pub strategy: Option<RetrievalStrategy>,
}

impl RetrievalOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record reported by `source`, if any
    pub fn record_from(&self, source: &str) -> Option<&SourceRecord> {
        self.records.iter().find(|r| r.source_name == source)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
