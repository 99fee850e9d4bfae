//! Firecrawl scraping client: extracts the main content of a URL as markdown.
//!
//! The scrape call carries a bounded timeout so a slow upstream cannot hang
//! a capture indefinitely. Scraping is single-shot; the pipeline decides
//! whether a failure is recoverable.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const FIRECRAWL_API_URL: &str = "https://api.firecrawl.dev/v1/scrape";

/// Default upper bound on a single scrape request.
pub const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 60;

/// Error from the scraping collaborator.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("scraper credential not configured")]
    NotConfigured,

    #[error("scraper API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("scraper returned an unsuccessful response")]
    Unsuccessful,

    #[error("scrape request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Extracted page content.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapedContent {
    /// Main content of the page as markdown.
    #[serde(default)]
    pub markdown: String,
    /// Page metadata as returned by the scraper (title, og tags, ...).
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Trait for content-extraction clients.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Fetch `url` and return its main content as markdown.
    async fn scrape_markdown(&self, url: &str) -> Result<ScrapedContent, ScrapeError>;
}

/// Firecrawl API client.
pub struct FirecrawlClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl FirecrawlClient {
    /// Create a new client with a bounded request timeout.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            api_url: FIRECRAWL_API_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (self-hosted Firecrawl).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl Scraper for FirecrawlClient {
    async fn scrape_markdown(&self, url: &str) -> Result<ScrapedContent, ScrapeError> {
        tracing::info!("Starting scrape for {}", url);

        let request = ScrapeRequest {
            url,
            formats: ["markdown"],
            only_main_content: false,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ScrapeResponse = response.json().await?;
        if !parsed.success {
            return Err(ScrapeError::Unsuccessful);
        }

        let content = parsed.data.ok_or(ScrapeError::Unsuccessful)?;
        tracing::info!("Scrape succeeded, {} chars of markdown", content.markdown.len());
        Ok(content)
    }
}

/// Firecrawl scrape request body.
#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 1],
    #[serde(rename = "onlyMainContent")]
    only_main_content: bool,
}

/// Firecrawl scrape response body.
#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapedContent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_wire_contract() {
        let request = ScrapeRequest {
            url: "https://example.com/post",
            formats: ["markdown"],
            only_main_content: false,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["url"], "https://example.com/post");
        assert_eq!(value["formats"][0], "markdown");
        assert_eq!(value["onlyMainContent"], false);
    }

    #[test]
    fn response_parses_markdown_payload() {
        let body = r##"{
            "success": true,
            "data": {"markdown": "# Title\n\nBody", "metadata": {"title": "Title"}}
        }"##;

        let parsed: ScrapeResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.data.unwrap().markdown, "# Title\n\nBody");
    }

    #[test]
    fn unsuccessful_response_has_no_data() {
        let body = r#"{"success": false}"#;
        let parsed: ScrapeResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.success);
        assert!(parsed.data.is_none());
    }
}
