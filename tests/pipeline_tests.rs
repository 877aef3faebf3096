//! End-to-end reconciliation tests
//!
//! Entries go through normalize, retrieve, score and classify against
//! in-process adapters and mocked registries. No test touches the network.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use httpmock::prelude::*;

use cite_check::matching::MatchClassifier;
use cite_check::parsing::citation::{parse_line, parse_lines};
use cite_check::sources::crossref::Crossref;
use cite_check::sources::http::build_client;
use cite_check::sources::openlibrary::OpenLibrary;
use cite_check::sources::Capabilities;
use cite_check::{
    BibliographicEntry, IdentifierKind, MatchStatus, Reconciler, ReconcilerConfig, SourceAdapter,
    SourceRecord, SourceRegistry,
};

/// Adapter answering every lookup with a fixed record, optionally after a delay
struct FixedSource {
    name: &'static str,
    capabilities: Capabilities,
    record: Option<(&'static str, Vec<&'static str>)>,
    delay: Duration,
}

impl FixedSource {
    fn answering(name: &'static str, title: &'static str, authors: &[&'static str]) -> Self {
        Self {
            name,
            capabilities: Capabilities::doi(),
            record: Some((title, authors.to_vec())),
            delay: Duration::ZERO,
        }
    }

    fn silent(name: &'static str) -> Self {
        Self {
            name,
            capabilities: Capabilities::doi(),
            record: None,
            delay: Duration::ZERO,
        }
    }

    fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl SourceAdapter for FixedSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn fetch(&self, _identifier: &str) -> Option<SourceRecord> {
        tokio::time::sleep(self.delay).await;
        self.record
            .as_ref()
            .map(|(title, authors)| SourceRecord::new(self.name, *title).with_authors(authors.clone()))
    }
}

fn reconciler(sources: Vec<FixedSource>, call_timeout: Duration) -> Reconciler {
    let adapters: Vec<Arc<dyn SourceAdapter>> = sources
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn SourceAdapter>)
        .collect();
    let mut config = ReconcilerConfig::default();
    config.retrieval.call_timeout = call_timeout;
    Reconciler::new(SourceRegistry::from_adapters(adapters), config)
}

fn sample_entry() -> BibliographicEntry {
    BibliographicEntry::new(IdentifierKind::Doi, "10.1000/xyz123", "Sample Title")
        .with_authors(["Smith"])
}

#[tokio::test]
async fn test_exact_match() {
    let reconciler = reconciler(
        vec![FixedSource::answering("Registry", "Sample Title", &["Smith"])],
        Duration::from_secs(1),
    );

    let report = reconciler.check(&sample_entry()).await.unwrap();

    assert_eq!(report.comparisons[0].title_score, 100);
    assert!(report.comparisons[0].author_match);
    assert_eq!(report.verdict.best_source, "Registry");
    assert_eq!(report.verdict.best_score, 100);
    assert!(report.verdict.author_found);
    assert_eq!(report.verdict.status, MatchStatus::Match);
}

#[tokio::test]
async fn test_partial_match_title_only() {
    let reconciler = reconciler(
        vec![FixedSource::answering("Registry", "Sample Title", &["Jones"])],
        Duration::from_secs(1),
    );

    let report = reconciler.check(&sample_entry()).await.unwrap();

    assert_eq!(report.comparisons[0].title_score, 100);
    assert!(!report.comparisons[0].author_match);
    assert_eq!(report.verdict.status, MatchStatus::PartialMatch);
}

#[tokio::test]
async fn test_no_source_responds() {
    let reconciler = reconciler(
        vec![FixedSource::silent("A"), FixedSource::silent("B")],
        Duration::from_secs(1),
    );

    let report = reconciler.check(&sample_entry()).await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.verdict.best_source, "none");
    assert_eq!(report.verdict.best_score, 0);
    assert!(!report.verdict.author_found);
    assert_eq!(report.verdict.status, MatchStatus::NoMatch);
}

#[tokio::test]
async fn test_fan_in_excludes_timed_out_source() {
    let reconciler = reconciler(
        vec![
            FixedSource::answering("Hung", "Sample Title", &["Smith"]).after(Duration::from_secs(30)),
            FixedSource::answering("Fast", "Sample Title", &["Smith"]),
            FixedSource::answering("Quick", "Other Title", &[]).after(Duration::from_millis(20)),
        ],
        Duration::from_millis(200),
    );

    let start = Instant::now();
    let report = reconciler.check(&sample_entry()).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    let sources: Vec<&str> = report.records.iter().map(|r| r.source_name.as_str()).collect();
    assert_eq!(sources, vec!["Fast", "Quick"]);
    assert_eq!(report.attempted, vec!["Hung", "Fast", "Quick"]);
    assert_eq!(report.verdict.best_source, "Fast");
}

#[tokio::test]
async fn test_classify_empty_is_no_match() {
    let verdict = MatchClassifier::default().classify(&sample_entry(), &[]);
    assert_eq!(verdict.status, MatchStatus::NoMatch);
    assert_eq!(verdict.best_source, "none");
}

#[tokio::test]
async fn test_reading_list_keeps_order_and_skips_invalid() {
    let lines = [
        "Literatur",
        "Smith, Journal, Sample Title, 2020 [DOI: 10.1000/xyz123]",
        "Jones, Verlag, Broken Entry [ISBN: --]",
        "Smith, Journal, Another Title, 2021 [DOI: 10.1000/abc]",
    ];
    let parsed = parse_lines(&lines).unwrap();
    assert_eq!(parsed.entries.len(), 3);
    assert_eq!(parsed.skipped_lines, 1);

    let reconciler = reconciler(
        vec![FixedSource::answering("Registry", "Sample Title", &["John Smith"])],
        Duration::from_secs(1),
    );
    let results = reconciler.check_all(&parsed.entries).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().verdict.status, MatchStatus::Match);
    assert!(results[1].is_err());
    // Title differs, author matches
    assert_eq!(results[2].as_ref().unwrap().verdict.status, MatchStatus::PartialMatch);
}

#[tokio::test]
async fn test_title_written_last_still_matches() {
    let entry = parse_line("Smith, Journal of Tests, Sample Title [DOI: 10.1000/xyz123]").unwrap();
    let reconciler = reconciler(
        vec![FixedSource::answering("Registry", "Sample Title", &["John Smith"])],
        Duration::from_secs(1),
    );

    let report = reconciler.check(&entry).await.unwrap();

    assert_eq!(report.verdict.best_score, 100);
    assert_eq!(report.verdict.status, MatchStatus::Match);
}

#[tokio::test]
async fn test_non_ascii_identifier_does_not_abort_list() {
    let lines = [
        "Müller, Zeitschrift, Titel [DOI: 10.ä/abc]",
        "Smith, Journal, Sample Title, 2020 [DOI: 10.1000/xyz123]",
    ];
    let parsed = parse_lines(&lines).unwrap();
    let reconciler = reconciler(
        vec![FixedSource::answering("Registry", "Sample Title", &["Smith"])],
        Duration::from_secs(1),
    );

    let results = reconciler.check_all(&parsed.entries).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().identifier.canonical, "10.ä/abc");
    assert_eq!(results[1].as_ref().unwrap().verdict.status, MatchStatus::Match);
}

#[tokio::test]
async fn test_crossref_over_http() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/works/10.1000/xyz123");
            then.status(200).json_body(serde_json::json!({
                "message": {
                    "title": ["Sample Title"],
                    "author": [{"given": "John", "family": "Smith"}]
                }
            }));
        })
        .await;

    let client = build_client(Duration::from_secs(2)).unwrap();
    let crossref: Arc<dyn SourceAdapter> = Arc::new(Crossref::with_base_url(client, server.base_url()));
    let registry = SourceRegistry::from_adapters(vec![crossref]);
    let reconciler = Reconciler::new(registry, ReconcilerConfig::default());

    let report = reconciler.check(&sample_entry()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(report.verdict.best_source, "Crossref");
    assert_eq!(report.verdict.matched_authors, vec!["John Smith".to_string()]);
    assert_eq!(report.verdict.status, MatchStatus::Match);
}

#[tokio::test]
async fn test_isbn_title_fallback_over_http() {
    let server = MockServer::start_async().await;
    // Every ISBN lookup finds nothing
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/books");
            then.status(200).json_body(serde_json::json!({}));
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/search.json")
                .query_param("title", "Geschichte der Stadt");
            then.status(200).json_body(serde_json::json!({
                "docs": [{"title": "Geschichte der Stadt", "author_name": ["Hans Müller"]}]
            }));
        })
        .await;

    let client = build_client(Duration::from_secs(2)).unwrap();
    let open_library: Arc<dyn SourceAdapter> =
        Arc::new(OpenLibrary::with_base_url(client, server.base_url()));
    let registry = SourceRegistry::from_adapters(vec![open_library]);
    let reconciler = Reconciler::new(registry, ReconcilerConfig::default());

    let entry = BibliographicEntry::new(IdentifierKind::Isbn, "3-7965-1914-4", "Geschichte der Stadt")
        .with_authors(["Müller"]);
    let report = reconciler.check(&entry).await.unwrap();

    search.assert_async().await;
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.verdict.best_source, "Open Library");
    assert_eq!(report.verdict.status, MatchStatus::Match);
}
