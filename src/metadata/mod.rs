//! Third-party game metadata API
//!
//! A single lookup by game name returning one flat JSON object.

mod models;

use async_trait::async_trait;
use std::time::Instant;

pub use models::{MetadataResponse, SCREENSHOT_SLOTS, is_truthy, parse_size};

use crate::error::AppError;

/// Game metadata lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataApi: Send + Sync {
    /// Look a game up by its (sanitized) display name
    ///
    /// A response with a non-zero `error` is still returned as `Ok`;
    /// deciding what to do with it is up to the caller.
    async fn fetch(&self, name: &str) -> Result<MetadataResponse, AppError>;
}

/// Metadata client over HTTP
pub struct HttpMetadataClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpMetadataClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn lookup_url(&self, name: &str) -> String {
        format!(
            "{}?key={}&name={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(name)
        )
    }
}

#[async_trait]
impl MetadataApi for HttpMetadataClient {
    async fn fetch(&self, name: &str) -> Result<MetadataResponse, AppError> {
        let started = Instant::now();
        let result = self.http.get(self.lookup_url(name)).send().await;

        let status = match &result {
            Ok(response) => response.status().as_u16().to_string(),
            Err(_) => "error".to_string(),
        };
        crate::metrics::observe_upstream("metadata", &status, started.elapsed());

        let response = result?;
        if !response.status().is_success() {
            return Err(AppError::Metadata(format!(
                "metadata API returned HTTP {}",
                response.status()
            )));
        }

        let body = response.json::<MetadataResponse>().await?;
        tracing::debug!(name = %name, error = body.error, "Metadata lookup completed");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_url_encodes_name_and_key() {
        let client = HttpMetadataClient::new(
            reqwest::Client::new(),
            "https://metadata.example.com/game",
            "k&y",
        );

        assert_eq!(
            client.lookup_url("Ratchet & Clank: Rift Apart"),
            "https://metadata.example.com/game?key=k%26y&name=Ratchet%20%26%20Clank%3A%20Rift%20Apart"
        );
    }
}
