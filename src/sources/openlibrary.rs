//! Open Library books API (ISBN) and search API (title fallback).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{encode, get_json};
use super::{absorb, build_record, Capabilities, SourceAdapter, SourceError};
use crate::core::entry::normalize_author;
use crate::core::record::SourceRecord;

const DEFAULT_BASE_URL: &str = "https://openlibrary.org";

#[derive(Debug, Deserialize)]
struct Book {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Vec<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
}

pub struct OpenLibrary {
    client: reqwest::Client,
    base_url: String,
}

impl OpenLibrary {
    pub const NAME: &'static str = "Open Library";

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
        let key = format!("ISBN:{isbn}");
        let url = format!(
            "{}/api/books?bibkeys={}&jscmd=data&format=json",
            self.base_url,
            encode(&key)
        );

        // Unknown ISBNs come back as an empty object
        let Some(mut books) =
            get_json::<HashMap<String, Book>>(&self.client, &url, "application/json").await?
        else {
            return Ok(None);
        };
        let Some(book) = books.remove(&key) else {
            return Ok(None);
        };

        let authors = book
            .authors
            .into_iter()
            .filter_map(|a| a.name)
            .map(|name| normalize_author(&name));
        build_record(Self::NAME, book.title, authors).map(Some)
    }

    async fn search(&self, title: &str) -> Result<Option<SourceRecord>, SourceError> {
        let url = format!(
            "{}/search.json?title={}&limit=1",
            self.base_url,
            encode(title)
        );
        let Some(response) =
            get_json::<SearchResponse>(&self.client, &url, "application/json").await?
        else {
            return Ok(None);
        };

        let Some(doc) = response.docs.into_iter().next() else {
            return Ok(None);
        };

        let authors = doc.author_name.iter().map(|name| normalize_author(name));
        build_record(Self::NAME, doc.title, authors).map(Some)
    }
}

#[async_trait]
impl SourceAdapter for OpenLibrary {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::isbn().with_title_search()
    }

    async fn fetch(&self, identifier: &str) -> Option<SourceRecord> {
        absorb(Self::NAME, identifier, self.lookup(identifier).await)
    }

    async fn search_title(&self, title: &str) -> Option<SourceRecord> {
        absorb(Self::NAME, title, self.search(title).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::http::{build_client, DEFAULT_CALL_TIMEOUT};
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_keyed_by_isbn() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/books")
                    .query_param("bibkeys", "ISBN:3796519144")
                    .query_param("jscmd", "data");
                then.status(200).json_body(serde_json::json!({
                    "ISBN:3796519144": {
                        "title": "Geschichte der Stadt",
                        "authors": [{"name": "Hans Müller", "url": "https://openlibrary.org/authors/x"}]
                    }
                }));
            })
            .await;

        let client = build_client(DEFAULT_CALL_TIMEOUT).unwrap();
        let adapter = OpenLibrary::with_base_url(client, server.base_url());
        let record = adapter.fetch("3796519144").await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.source_name, "Open Library");
        assert_eq!(record.title, "Geschichte der Stadt");
        assert_eq!(record.authors, vec!["Hans Müller".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_unknown_isbn_empty_object() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/books");
                then.status(200).json_body(serde_json::json!({}));
            })
            .await;

        let client = build_client(DEFAULT_CALL_TIMEOUT).unwrap();
        let adapter = OpenLibrary::with_base_url(client, server.base_url());
        assert!(adapter.fetch("0000000000").await.is_none());
    }

    #[tokio::test]
    async fn test_search_title() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search.json")
                    .query_param("title", "Geschichte der Stadt");
                then.status(200).json_body(serde_json::json!({
                    "numFound": 1,
                    "docs": [{"title": "Geschichte der Stadt", "author_name": ["Müller, Hans"]}]
                }));
            })
            .await;

        let client = build_client(DEFAULT_CALL_TIMEOUT).unwrap();
        let adapter = OpenLibrary::with_base_url(client, server.base_url());
        let record = adapter.search_title("Geschichte der Stadt").await.unwrap();
        assert_eq!(record.authors, vec!["Hans Müller".to_string()]);
    }
}
