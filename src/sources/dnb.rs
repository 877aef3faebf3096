//! Deutsche Nationalbibliothek SRU catalogs, queried for MARC21-xml.
//!
//! Two catalogs share the same interface: the national bibliography (`dnb`)
//! and the serials database (`zdb`). Both answer slowly and are only used
//! when slow sources are included.

use async_trait::async_trait;

use super::http::{encode, get_text};
use super::marc::parse_first_record;
use super::{absorb, build_record, Capabilities, SourceAdapter, SourceError};
use crate::core::record::SourceRecord;

const DEFAULT_BASE_URL: &str = "https://services.dnb.de/sru";

pub struct DnbCatalog {
    client: reqwest::Client,
    base_url: String,
    name: &'static str,
    catalog: &'static str,
}

impl DnbCatalog {
    pub const DNB_NAME: &'static str = "DNB";
    pub const ZDB_NAME: &'static str = "ZDB";

    /// National bibliography
    pub fn dnb(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL, Self::DNB_NAME, "dnb")
    }

    /// Serials database
    pub fn zdb(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL, Self::ZDB_NAME, "zdb")
    }

    pub fn with_base_url(
        client: reqwest::Client,
        base_url: impl Into<String>,
        name: &'static str,
        catalog: &'static str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            name,
            catalog,
        }
    }

    /// Run a CQL query such as `num=3796519144` or `tit=Geschichte`
    async fn query(&self, cql: &str) -> Result<Option<SourceRecord>, SourceError> {
        let url = format!(
            "{}/{}?version=1.1&operation=searchRetrieve&query={}&recordSchema=MARC21-xml&maximumRecords=1",
            self.base_url,
            self.catalog,
            encode(cql)
        );
        let Some(body) = get_text(&self.client, &url, "application/xml").await? else {
            return Ok(None);
        };

        let Some(fields) = parse_first_record(&body)? else {
            return Ok(None);
        };
        build_record(self.name, fields.title, fields.authors).map(Some)
    }
}

/// Quote a title for CQL; embedded quotes would end the term early
fn title_query(title: &str) -> String {
    let cleaned: String = title.chars().filter(|&c| c != '"' && c != '\\').collect();
    format!("tit=\"{}\"", cleaned.trim())
}

#[async_trait]
impl SourceAdapter for DnbCatalog {
    fn name(&self) -> &'static str {
        self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::isbn().with_title_search().slow()
    }

    async fn fetch(&self, identifier: &str) -> Option<SourceRecord> {
        let cql = format!("num={identifier}");
        absorb(self.name, identifier, self.query(&cql).await)
    }

    async fn search_title(&self, title: &str) -> Option<SourceRecord> {
        absorb(self.name, title, self.query(&title_query(title)).await)
    }
}
