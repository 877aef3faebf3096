//! Directory of Open Access Journals article search (DOI).

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{encode, get_json};
use super::{absorb, build_record, Capabilities, SourceAdapter, SourceError};
use crate::core::entry::normalize_author;
use crate::core::record::SourceRecord;

const DEFAULT_BASE_URL: &str = "https://doaj.org";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    bibjson: Option<BibJson>,
}

#[derive(Debug, Deserialize)]
struct BibJson {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Vec<BibJsonAuthor>,
}

#[derive(Debug, Deserialize)]
struct BibJsonAuthor {
    #[serde(default)]
    name: Option<String>,
}

pub struct Doaj {
    client: reqwest::Client,
    base_url: String,
}

impl Doaj {
    pub const NAME: &'static str = "DOAJ";

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
        // The DOI is a search term here, so its slash must be escaped
        let url = format!(
            "{}/api/v2/search/articles/doi:{}",
            self.base_url,
            encode(doi)
        );
        let Some(response) =
            get_json::<SearchResponse>(&self.client, &url, "application/json").await?
        else {
            return Ok(None);
        };

        let Some(bib) = response.results.into_iter().find_map(|a| a.bibjson) else {
            return Ok(None);
        };

        let authors = bib
            .author
            .into_iter()
            .filter_map(|a| a.name)
            .map(|name| normalize_author(&name));
        build_record(Self::NAME, bib.title, authors).map(Some)
    }
}

#[async_trait]
impl SourceAdapter for Doaj {
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
