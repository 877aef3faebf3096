//! doi.org content negotiation: the resolver answers with CSL-JSON when asked.

use async_trait::async_trait;
use serde::Deserialize;

use super::crossref::CslName;
use super::http::{encode_path, get_json};
use super::{absorb, build_record, Capabilities, SourceAdapter, SourceError};
use crate::core::record::SourceRecord;

const DEFAULT_BASE_URL: &str = "https://doi.org";
const CITEPROC_JSON: &str = "application/citeproc+json";

#[derive(Debug, Deserialize)]
struct CslItem {
    #[serde(default)]
    title: Option<CslTitle>,
    #[serde(default)]
    author: Vec<CslName>,
}

/// Some registration agencies serve `title` as a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CslTitle {
    Single(String),
    Many(Vec<String>),
}

impl CslTitle {
    fn into_first(self) -> Option<String> {
        match self {
            Self::Single(title) => Some(title),
            Self::Many(titles) => titles.into_iter().next(),
        }
    }
}

pub struct DoiContent {
    client: reqwest::Client,
    base_url: String,
}

impl DoiContent {
    pub const NAME: &'static str = "DOI Content Negotiation";

    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn lookup(&self, doi: &str) -> Result<Option<SourceRecord>, SourceError> {
        let url = format!("{}/{}", self.base_url, encode_path(doi));
        let Some(item) = get_json::<CslItem>(&self.client, &url, CITEPROC_JSON).await? else {
            return Ok(None);
        };

        let authors = item.author.iter().filter_map(CslName::display_name);
        build_record(Self::NAME, item.title.and_then(CslTitle::into_first), authors).map(Some)
    }
}

#[async_trait]
impl SourceAdapter for DoiContent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::doi()
    }

    async fn fetch(&self, identifier: &str) -> Option<SourceRecord> {
        absorb(Self::NAME, identifier, self.lookup(identifier).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::http::{build_client, DEFAULT_CALL_TIMEOUT};
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_requests_citeproc() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/10.1000/xyz123")
                    .header("accept", CITEPROC_JSON);
                then.status(200).json_body(serde_json::json!({
                    "type": "article-journal",
                    "title": "Sample Title",
                    "author": [{"given": "John", "family": "Smith"}]
                }));
            })
            .await;

        let client = build_client(DEFAULT_CALL_TIMEOUT).unwrap();
        let adapter = DoiContent::with_base_url(client, server.base_url());
        let record = adapter.fetch("10.1000/xyz123").await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.title, "Sample Title");
        assert_eq!(record.authors, vec!["John Smith".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_title_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/10.1000/list");
                then.status(200)
                    .json_body(serde_json::json!({"title": ["Listed Title"]}));
            })
            .await;

        let client = build_client(DEFAULT_CALL_TIMEOUT).unwrap();
        let adapter = DoiContent::with_base_url(client, server.base_url());
        let record = adapter.fetch("10.1000/list").await.unwrap();
        assert_eq!(record.title, "Listed Title");
        assert!(record.authors.is_empty());
    }
}
