//! DataCite REST API (DOIs for datasets, software and grey literature).

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{encode_path, get_json};
use super::{absorb, build_record, Capabilities, SourceAdapter, SourceError};
use crate::core::entry::normalize_author;
use crate::core::record::SourceRecord;

const DEFAULT_BASE_URL: &str = "https://api.datacite.org";

#[derive(Debug, Deserialize)]
struct DoiResponse {
    data: DoiData,
}

#[derive(Debug, Deserialize)]
struct DoiData {
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
struct Attributes {
    /// Legacy shape: plain list of strings
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    titles: Vec<TitleObject>,
    #[serde(default)]
    creators: Vec<Creator>,
}

#[derive(Debug, Deserialize)]
struct TitleObject {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Creator {
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl Creator {
    fn display_name(&self) -> Option<String> {
        match (&self.family_name, &self.name) {
            (Some(family), _) => {
                let given = self.given_name.as_deref().unwrap_or_default();
                Some(normalize_author(&format!("{given} {family}")))
            }
            (None, Some(name)) => Some(normalize_author(name)),
            (None, None) => None,
        }
    }
}

pub struct DataCite {
    client: reqwest::Client,
    base_url: String,
}

impl DataCite {
    pub const NAME: &'static str = "DataCite";

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
        let url = format!("{}/dois/{}", self.base_url, encode_path(doi));
        let Some(response) =
            get_json::<DoiResponse>(&self.client, &url, "application/vnd.api+json").await?
        else {
            return Ok(None);
        };

        let Attributes {
            title,
            titles,
            creators,
        } = response.data.attributes;

        let title = title
            .into_iter()
            .next()
            .or_else(|| titles.into_iter().next().map(|t| t.title));
        let authors = creators.iter().filter_map(Creator::display_name);
        build_record(Self::NAME, title, authors).map(Some)
    }
}

#[async_trait]
impl SourceAdapter for DataCite {
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
    async fn test_fetch_titles_objects() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/dois/10.5061/dryad.abc");
                then.status(200).json_body(serde_json::json!({
                    "data": {
                        "id": "10.5061/dryad.abc",
                        "attributes": {
                            "titles": [{"title": "Field Survey Data"}],
                            "creators": [
                                {"name": "Doe, Jane", "givenName": "Jane", "familyName": "Doe"},
                                {"name": "Survey Consortium"}
                            ]
                        }
                    }
                }));
            })
            .await;

        let client = build_client(DEFAULT_CALL_TIMEOUT).unwrap();
        let adapter = DataCite::with_base_url(client, server.base_url());
        let record = adapter.fetch("10.5061/dryad.abc").await.unwrap();

        assert_eq!(record.title, "Field Survey Data");
        assert_eq!(
            record.authors,
            vec!["Jane Doe".to_string(), "Survey Consortium".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fetch_legacy_title_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/dois/10.5061/legacy");
                then.status(200).json_body(serde_json::json!({
                    "data": {"attributes": {"title": ["Legacy Title"], "creators": []}}
                }));
            })
            .await;

        let client = build_client(DEFAULT_CALL_TIMEOUT).unwrap();
        let adapter = DataCite::with_base_url(client, server.base_url());
        let record = adapter.fetch("10.5061/legacy").await.unwrap();
        assert_eq!(record.title, "Legacy Title");
    }

    #[tokio::test]
    async fn test_fetch_missing_attributes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/dois/10.5061/odd");
                then.status(200).json_body(serde_json::json!({"errors": []}));
            })
            .await;

        let client = build_client(DEFAULT_CALL_TIMEOUT).unwrap();
        let adapter = DataCite::with_base_url(client, server.base_url());
        assert!(adapter.fetch("10.5061/odd").await.is_none());
    }
}
