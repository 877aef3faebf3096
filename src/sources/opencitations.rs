//! OpenCitations index metadata API (DOI).
//!
//! The author field is one string of `Family, Given` names separated by `;`,
//! sometimes followed by an ORCID reference.

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{encode_path, get_json};
use super::{absorb, build_record, Capabilities, SourceAdapter, SourceError};
use crate::core::entry::normalize_author;
use crate::core::record::SourceRecord;

const DEFAULT_BASE_URL: &str = "https://opencitations.net";

#[derive(Debug, Deserialize)]
struct Metadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

pub struct OpenCitations {
    client: reqwest::Client,
    base_url: String,
}

impl OpenCitations {
    pub const NAME: &'static str = "OpenCitations";

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
        let url = format!("{}/index/api/v1/metadata/{}", self.base_url, encode_path(doi));
        let Some(rows) = get_json::<Vec<Metadata>>(&self.client, &url, "application/json").await?
        else {
            return Ok(None);
        };

        let Some(first) = rows.into_iter().next() else {
            return Ok(None);
        };

        let authors = first
            .author
            .as_deref()
            .map(split_authors)
            .unwrap_or_default();
        build_record(Self::NAME, first.title, authors).map(Some)
    }
}

/// Split `"Doe, Jane, 0000-0001-2345-6789; Roe, Richard"` into display names
fn split_authors(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(|person| {
            // Drop a trailing ORCID component if present
            let mut parts: Vec<&str> = person.split(',').map(str::trim).collect();
            if parts.len() > 2 && parts.last().is_some_and(|p| looks_like_orcid(p)) {
                parts.pop();
            }
            normalize_author(&parts.join(", "))
        })
        .filter(|name| !name.is_empty())
        .collect()
}

fn looks_like_orcid(value: &str) -> bool {
    value.len() == 19
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-' || c == 'X')
}

#[async_trait]
impl SourceAdapter for OpenCitations {
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
