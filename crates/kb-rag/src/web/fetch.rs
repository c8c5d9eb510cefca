//! Page fetching for web ingestion

use std::time::Duration;
use tracing::debug;

use crate::config::WebConfig;
use crate::error::{Error, Result};
use crate::ingestion::extract::extract_html;

/// Downloads a page and reduces it to readable text
pub struct WebFetcher {
    client: reqwest::Client,
}

impl WebFetcher {
    pub fn new(config: &WebConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Fetch `url` and return its readable text.
    ///
    /// Non-2xx statuses, network failures, and pages with no extractable
    /// text all come back as `FetchFailed` naming the URL, so a batch
    /// caller can report per-URL outcomes.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch_failed(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch_failed(url, format!("HTTP {status}")));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::fetch_failed(url, e.to_string()))?;

        let text = extract_html(&html);
        if text.trim().is_empty() {
            return Err(Error::fetch_failed(url, "page yielded no readable text"));
        }
        debug!(url, chars = text.len(), "fetched page text");
        Ok(text)
    }
}
