//! WorldCat union catalog over SRU (search/retrieve via URL), ISBN only.
//!
//! The record schema varies with the subscription, so the mapping is
//! deliberately loose: the first element whose local name ends in `title` is
//! the title, and every element whose local name ends in `name` is an author.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::http::{encode, get_text};
use super::{absorb, build_record, Capabilities, SourceAdapter, SourceError};
use crate::core::entry::normalize_author;
use crate::core::record::SourceRecord;

const DEFAULT_BASE_URL: &str = "https://worldcat.org/webservices/catalog/search/sru";

pub struct WorldCat {
    client: reqwest::Client,
    base_url: String,
}

impl WorldCat {
    pub const NAME: &'static str = "WorldCat";

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
            "{}?version=1.2&operation=searchRetrieve&query={}&maximumRecords=1",
            self.base_url,
            encode(&format!("isbn={isbn}"))
        );
        let Some(body) = get_text(&self.client, &url, "application/xml").await? else {
            return Ok(None);
        };

        let Some((title, authors)) = parse_first_record(&body)? else {
            return Ok(None);
        };
        build_record(Self::NAME, title, authors).map(Some)
    }
}

/// Title and author names from the first `record` element of an SRU response.
///
/// Returns `None` when the response holds no record.
fn parse_first_record(xml: &str) -> Result<Option<(Option<String>, Vec<String>)>, SourceError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut record_depth: Option<usize> = None;
    let mut title: Option<String> = None;
    let mut authors = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if record_depth.is_none() && name == "record" {
                    record_depth = Some(stack.len());
                }
                stack.push(name);
            }
            Event::End(_) => {
                stack.pop();
                if record_depth.is_some_and(|depth| stack.len() <= depth) {
                    break;
                }
            }
            Event::Text(e) if record_depth.is_some() => {
                let Some(current) = stack.last() else {
                    continue;
                };
                let text = e.unescape()?;
                if current.ends_with("title") && title.is_none() {
                    title = Some(text.to_string());
                } else if current.ends_with("name") {
                    authors.push(normalize_author(&text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(record_depth.map(|_| (title, authors)))
}

#[async_trait]
impl SourceAdapter for WorldCat {
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
