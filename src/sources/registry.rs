//! The single ordered list of registry adapters.
//!
//! Registration order is significant: it is the submission order for
//! fan-out, the order in which duplicate records are resolved, and the
//! tie-break order for classification.

use std::sync::Arc;

use serde::Serialize;

use super::crossref::Crossref;
use super::datacite::DataCite;
use super::dnb::DnbCatalog;
use super::doaj::Doaj;
use super::doi_content::DoiContent;
use super::google_books::GoogleBooks;
use super::openlibrary::OpenLibrary;
use super::opencitations::OpenCitations;
use super::worldcat::WorldCat;
use super::{Capabilities, SourceAdapter};
use crate::core::types::IdentifierKind;

/// Name and capabilities of one registered adapter, for listings
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub name: &'static str,
    #[serde(flatten)]
    pub capabilities: Capabilities,
}

#[derive(Clone, Default)]
pub struct SourceRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    /// Registry with every known adapter, sharing one HTTP client
    pub fn with_default_sources(client: &reqwest::Client) -> Self {
        Self::from_adapters(vec![
            Arc::new(Crossref::new(client.clone())) as Arc<dyn SourceAdapter>,
            Arc::new(OpenCitations::new(client.clone())),
            Arc::new(Doaj::new(client.clone())),
            Arc::new(DoiContent::new(client.clone())),
            Arc::new(DataCite::new(client.clone())),
            Arc::new(OpenLibrary::new(client.clone())),
            Arc::new(GoogleBooks::new(client.clone())),
            Arc::new(WorldCat::new(client.clone())),
            Arc::new(DnbCatalog::dnb(client.clone())),
            Arc::new(DnbCatalog::zdb(client.clone())),
        ])
    }

    pub fn from_adapters(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Adapters that accept identifiers of `kind`, in registration order.
    ///
    /// Slow adapters are only included when `include_slow` is set.
    pub fn select(&self, kind: IdentifierKind, include_slow: bool) -> Vec<Arc<dyn SourceAdapter>> {
        self.filtered(|caps| caps.supports(kind) && (include_slow || !caps.is_slow))
    }

    /// Adapters that accept title queries, in registration order
    pub fn title_searchers(&self, include_slow: bool) -> Vec<Arc<dyn SourceAdapter>> {
        self.filtered(|caps| caps.supports_title_search && (include_slow || !caps.is_slow))
    }

    pub fn describe(&self) -> Vec<SourceInfo> {
        self.adapters
            .iter()
            .map(|a| SourceInfo {
                name: a.name(),
                capabilities: a.capabilities(),
            })
            .collect()
    }

    fn filtered(&self, keep: impl Fn(&Capabilities) -> bool) -> Vec<Arc<dyn SourceAdapter>> {
        self.adapters
            .iter()
            .filter(|a| keep(&a.capabilities()))
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.adapters.iter().map(|a| a.name()))
            .finish()
    }
}
