//! Crossref REST API, the primary DOI registry.

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{encode_path, get_json};
use super::{absorb, build_record, Capabilities, SourceAdapter, SourceError};
use crate::core::entry::normalize_author;
use crate::core::record::SourceRecord;

const DEFAULT_BASE_URL: &str = "https://api.crossref.org";

#[derive(Debug, Deserialize)]
struct WorkResponse {
    message: Work,
}

#[derive(Debug, Deserialize)]
struct Work {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<CslName>,
}

/// A citeproc (CSL-JSON) name, as served by Crossref and DOI content negotiation
#[derive(Debug, Deserialize)]
pub(crate) struct CslName {
    #[serde(default)]
    given: Option<String>,
    #[serde(default)]
    family: Option<String>,
    /// Institutional authors carry a single literal name
    #[serde(default)]
    name: Option<String>,
}

impl CslName {
    /// "Given Family", or the literal name for institutional authors
    pub(crate) fn display_name(&self) -> Option<String> {
        match (&self.family, &self.name) {
            (Some(family), _) => {
                let given = self.given.as_deref().unwrap_or_default();
                Some(normalize_author(&format!("{given} {family}")))
            }
            (None, Some(name)) => Some(normalize_author(name)),
            (None, None) => None,
        }
    }
}

pub struct Crossref {
    client: reqwest::Client,
    base_url: String,
}

impl Crossref {
    pub const NAME: &'static str = "Crossref";

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
        let url = format!("{}/works/{}", self.base_url, encode_path(doi));
        let Some(response) = get_json::<WorkResponse>(&self.client, &url, "application/json").await?
        else {
            return Ok(None);
        };

        let work = response.message;
        let authors = work.author.iter().filter_map(CslName::display_name);
        build_record(Self::NAME, work.title.into_iter().next(), authors).map(Some)
    }
}

#[async_trait]
impl SourceAdapter for Crossref {
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
