//! Google Books volumes API (ISBN).

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{encode, get_json};
use super::{absorb, build_record, Capabilities, SourceAdapter, SourceError};
use crate::core::entry::normalize_author;
use crate::core::record::SourceRecord;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1";

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize)]
struct VolumeInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
}

pub struct GoogleBooks {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleBooks {
    pub const NAME: &'static str = "Google Books";

    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn lookup(&self, isbn: &str) -> Result<Option<SourceRecord>, SourceError> {
        let url = format!(
            "{}/volumes?q={}",
            self.base_url,
            encode(&format!("isbn:{isbn}"))
        );
        let Some(response) =
            get_json::<VolumesResponse>(&self.client, &url, "application/json").await?
        else {
            return Ok(None);
        };

        // Only the first hit counts; a later volume is a different book
        let Some(info) = response.items.into_iter().next().and_then(|v| v.volume_info) else {
            return Ok(None);
        };

        let authors = info.authors.iter().map(|name| normalize_author(name));
        build_record(Self::NAME, info.title, authors).map(Some)
    }
}

#[async_trait]
impl SourceAdapter for GoogleBooks {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::isbn()
    }

    async fn fetch(&self, identifier: &str) -> Option<SourceRecord> {
        absorb(Self::NAME, identifier, self.lookup(identifier).await)
    }
}
