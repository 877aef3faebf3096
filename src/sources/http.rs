//! Shared HTTP plumbing for registry adapters.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::SourceError;

pub const USER_AGENT: &str = concat!(
    "cite-check/",
    env!("CARGO_PKG_VERSION"),
    " (bibliography reconciliation)"
);

/// Per-request timeout used when a client is built without an explicit one
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(8);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the client shared by all adapters.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_client(call_timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(call_timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(call_timeout))
        .build()
}

/// GET `url` and decode a JSON body.
///
/// A 404 is reported as `Ok(None)`: registries use it for "unknown identifier".
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    accept: &str,
) -> Result<Option<T>, SourceError> {
    let Some(body) = get_text(client, url, accept).await? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(&body)?))
}

/// GET `url` and return the body as text
pub(crate) async fn get_text(
    client: &reqwest::Client,
    url: &str,
    accept: &str,
) -> Result<Option<String>, SourceError> {
    debug!(url, "Querying registry");

    let response = client.get(url).header(ACCEPT, accept).send().await?;
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }

    Ok(Some(response.text().await?))
}

/// Percent-encode a value for use in a URL path or query
pub(crate) fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Percent-encode an identifier placed in a URL path, keeping its slashes.
///
/// SICI-style DOIs contain `#`, `;` and `<>`, which would otherwise end the
/// path or be dropped as a fragment.
pub(crate) fn encode_path(value: &str) -> String {
    value.split('/').map(encode).collect::<Vec<_>>().join("/")
}
