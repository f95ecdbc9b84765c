#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for apkidx
//!
//! This crate handles all HTTP operations: the per-mirror index race and the
//! public key bootstrap.

mod client;
pub mod fetch;
pub mod keys;

pub use client::{ClientIdentity, NetClient, NetConfig};
pub use fetch::{fetch_all, FetchReport, IndexRequest};
pub use keys::fetch_missing_keys;

use apkidx_errors::{Error, NetworkError};
use tracing::debug;
use url::Url;

/// Fetch text content from a URL
///
/// # Errors
///
/// Returns an error if the HTTP request fails, the server returns an error status,
/// or the response body cannot be decoded as text.
pub async fn fetch_text(client: &NetClient, url: &str) -> Result<String, Error> {
    debug!(url, "fetching text");

    let response = client.get(url, None).await?;

    if !response.status().is_success() {
        return Err(NetworkError::HttpError {
            status: response.status().as_u16(),
            message: response.status().to_string(),
        }
        .into());
    }

    response
        .text()
        .await
        .map_err(|e| NetworkError::DownloadFailed(e.to_string()).into())
}

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com").is_ok());
        assert!(parse_url("not a url").is_err());
    }
}
