use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{RetrievalConfig, RetrievalOutcome, RetrievalStrategy};
use crate::core::entry::BibliographicEntry;
use crate::core::identifier::NormalizedIdentifier;
use crate::core::record::SourceRecord;
use crate::sources::registry::SourceRegistry;
use crate::sources::SourceAdapter;

/// What a single registry call is asked
#[derive(Debug, Clone, Copy)]
enum Query<'a> {
    Identifier(&'a str),
    Title(&'a str),
}

impl Query<'_> {
    fn as_str(&self) -> &str {
        match self {
            Self::Identifier(s) | Self::Title(s) => s,
        }
    }
}

/// Caps on in-flight calls, one semaphore per registered source.
///
/// Clones share the same semaphores: every orchestrator built from one
/// `SourceLimits` draws on the same per-source budget.
#[derive(Debug, Clone)]
pub struct SourceLimits {
    semaphores: Arc<HashMap<&'static str, Semaphore>>,
}

impl SourceLimits {
    pub fn new(registry: &SourceRegistry, permits_per_source: usize) -> Self {
        let permits = permits_per_source.max(1);
        let semaphores = registry
            .describe()
            .into_iter()
            .map(|info| (info.name, Semaphore::new(permits)))
            .collect();
        Self {
            semaphores: Arc::new(semaphores),
        }
    }

    fn get(&self, source: &str) -> Option<&Semaphore> {
        self.semaphores.get(source)
    }

    /// Permits currently free for `source`, if it has a limit
    pub fn available(&self, source: &str) -> Option<usize> {
        self.get(source).map(Semaphore::available_permits)
    }
}

/// Gathers records for entries from the registered sources.
///
/// One orchestrator is shared by all entries of a run so that the
/// per-source concurrency cap holds across entries. Runs that should share
/// the cap with each other use [`RetrievalOrchestrator::with_limits`].
pub struct RetrievalOrchestrator {
    registry: SourceRegistry,
    config: RetrievalConfig,
    limits: SourceLimits,
}

impl RetrievalOrchestrator {
    pub fn new(registry: SourceRegistry, config: RetrievalConfig) -> Self {
        let limits = SourceLimits::new(&registry, config.max_concurrent_per_source);
        Self::with_limits(registry, config, limits)
    }

    /// Build an orchestrator that draws on existing per-source limits.
    ///
    /// `config.max_concurrent_per_source` is ignored; the permits were fixed
    /// when `limits` was created.
    pub fn with_limits(registry: SourceRegistry, config: RetrievalConfig, limits: SourceLimits) -> Self {
        Self {
            registry,
            config,
            limits,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn limits(&self) -> &SourceLimits {
        &self.limits
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Collect records for `entry`, trying each strategy in order until one
    /// finds something.
    pub async fn retrieve(
        &self,
        entry: &BibliographicEntry,
        identifier: &NormalizedIdentifier,
    ) -> RetrievalOutcome {
        let include_slow = self.config.include_slow_sources;
        let mut outcome = RetrievalOutcome::default();

        for strategy in RetrievalStrategy::ORDERED {
            if !strategy.applies_to(entry) {
                continue;
            }

            let adapters = match strategy {
                RetrievalStrategy::IdentifierFanOut => {
                    self.registry.select(identifier.kind, include_slow)
                }
                RetrievalStrategy::TitleSearch => self.registry.title_searchers(include_slow),
            };
            if adapters.is_empty() {
                continue;
            }

            for adapter in &adapters {
                if !outcome.attempted.iter().any(|name| name == adapter.name()) {
                    outcome.attempted.push(adapter.name().to_string());
                }
            }

            let records = match strategy {
                RetrievalStrategy::IdentifierFanOut => {
                    let queries: Vec<Query<'_>> = identifier
                        .lookup_keys()
                        .iter()
                        .map(|key| Query::Identifier(key.as_str()))
                        .collect();
                    self.fan_out(&adapters, &queries).await
                }
                RetrievalStrategy::TitleSearch => {
                    debug!(
                        identifier = %identifier.canonical,
                        title = %entry.title,
                        "Identifier lookup found nothing, falling back to title search"
                    );
                    self.fan_out(&adapters, &[Query::Title(entry.title.trim())])
                        .await
                }
            };

            if !records.is_empty() {
                outcome.records = records;
                outcome.strategy = Some(strategy);
                break;
            }
        }

        outcome
    }

    /// Run every (adapter, query) pair concurrently and keep the first
    /// record per source in submission order.
    async fn fan_out(
        &self,
        adapters: &[Arc<dyn SourceAdapter>],
        queries: &[Query<'_>],
    ) -> Vec<SourceRecord> {
        let calls = adapters.iter().flat_map(|adapter| {
            queries
                .iter()
                .map(move |query| self.bounded_call(adapter.as_ref(), *query))
        });
        let results = join_all(calls).await;

        let mut records: Vec<SourceRecord> = Vec::new();
        for record in results.into_iter().flatten() {
            if records.iter().any(|r| r.source_name == record.source_name) {
                continue;
            }
            records.push(record);
        }
        records
    }

    /// One registry call under the per-source cap and the per-call timeout
    async fn bounded_call(
        &self,
        adapter: &dyn SourceAdapter,
        query: Query<'_>,
    ) -> Option<SourceRecord> {
        let source = adapter.name();

        // Adapters registered after construction have no limit of their own
        let _permit = match self.limits.get(source) {
            Some(semaphore) => Some(semaphore.acquire().await.ok()?),
            None => None,
        };

        let call = async {
            match query {
                Query::Identifier(key) => adapter.fetch(key).await,
                Query::Title(title) => adapter.search_title(title).await,
            }
        };

        match timeout(self.config.call_timeout, call).await {
            Ok(record) => record,
            Err(_) => {
                warn!(
                    source,
                    query = query.as_str(),
                    timeout_secs = self.config.call_timeout.as_secs_f64(),
                    "Registry call timed out"
                );
                None
            }
        }
    }
}
