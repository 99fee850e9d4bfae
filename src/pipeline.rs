//! The ingestion pipeline: raw capture in, persisted memory record out.
//!
//! Four steps composed linearly: classify the input, acquire a text blob
//! (scrape or user note), analyze it with the language model, then compose
//! and persist the record. At most two outbound calls and one store write
//! per invocation; no retries beyond the analyzer's own opt-in policy.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::llm::CompletionClient;
use crate::memory::{ist_now, AnalysisResult, MemoryRecord, MemoryStore};
use crate::scrape::{ScrapeError, ScrapedContent, Scraper};
use crate::util::{strip_code_fences, truncate_chars};

/// Upper bound on the text sent to the analyzer, in characters.
const MAX_ANALYSIS_CHARS: usize = 50_000;

/// A capture submitted for ingestion. At least one of `url`/`text` must
/// be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequest {
    pub url: Option<String>,
    pub text: Option<String>,
    pub title: Option<String>,
}

/// Terminal outcome of a completed pipeline run.
///
/// A store-write failure is reported here rather than raised: everything
/// up to and including analysis propagates as [`PipelineError`], but the
/// final write is an expected, reportable outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessOutcome {
    fn saved(id: String, memory: MemoryRecord) -> Self {
        Self {
            success: true,
            id: Some(id),
            memory: Some(memory),
            error: None,
        }
    }

    fn write_failed(error: String) -> Self {
        Self {
            success: false,
            id: None,
            memory: None,
            error: Some(error),
        }
    }
}

/// Failures that propagate to the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("either a url or text content is required")]
    InvalidRequest,

    #[error("memory store is not initialized")]
    StoreUnavailable,

    #[error("content acquisition failed: {0}")]
    AcquisitionFailed(#[source] ScrapeError),

    #[error("content analysis failed: {0}")]
    AnalysisFailed(anyhow::Error),
}

/// The ingestion pipeline with its three collaborators.
///
/// Constructed once by the composition root; collaborators are shared
/// read-only across concurrent invocations. The scraper and store are
/// optional: a missing scraper degrades per the fallback rules, a
/// missing store rejects every capture up front.
pub struct Pipeline {
    scraper: Option<Arc<dyn Scraper>>,
    analyzer: Arc<dyn CompletionClient>,
    store: Option<Arc<dyn MemoryStore>>,
}

impl Pipeline {
    pub fn new(
        scraper: Option<Arc<dyn Scraper>>,
        analyzer: Arc<dyn CompletionClient>,
        store: Option<Arc<dyn MemoryStore>>,
    ) -> Self {
        Self {
            scraper,
            analyzer,
            store,
        }
    }

    pub fn scraper_ready(&self) -> bool {
        self.scraper.is_some()
    }

    pub fn store_ready(&self) -> bool {
        self.store.is_some()
    }

    /// Run one capture through the pipeline.
    ///
    /// The store precondition is checked before any external call so an
    /// unavailable store never costs a scrape or an analysis. Submitting
    /// the same content twice creates two records; there is no dedup.
    pub async fn process(&self, req: &ProcessRequest) -> Result<ProcessOutcome, PipelineError> {
        let store = self.store.as_ref().ok_or(PipelineError::StoreUnavailable)?;

        if req.url.is_none() && req.text.is_none() {
            return Err(PipelineError::InvalidRequest);
        }

        tracing::info!(
            "Processing capture: url={}",
            req.url.as_deref().unwrap_or("n/a")
        );

        let content = self.acquire(req).await?;
        let analysis = self.analyze(&content).await?;
        let record = MemoryRecord::compose(analysis, req.url.as_deref(), req.title.as_deref());

        match store.add_memory(&record).await {
            Ok(id) => {
                tracing::info!("Memory saved: id={}", id);
                Ok(ProcessOutcome::saved(id, record))
            }
            Err(err) => {
                tracing::error!("Memory write failed: {}", err);
                Ok(ProcessOutcome::write_failed(format!(
                    "store write failed: {err}"
                )))
            }
        }
    }

    /// Produce the single text blob fed to the analyzer.
    async fn acquire(&self, req: &ProcessRequest) -> Result<String, PipelineError> {
        let title = req.title.as_deref().unwrap_or_default();

        let scrape_target = req
            .url
            .as_deref()
            .filter(|url| !is_loopback_url(url));

        let Some(url) = scrape_target else {
            // Loopback URLs are unreachable by the scraping service, so
            // they take the direct-text path even when text is absent.
            tracing::info!("Using provided text");
            return Ok(format!(
                "Title: {}\nContent: {}",
                title,
                req.text.as_deref().unwrap_or_default()
            ));
        };

        match self.scrape(url).await {
            Ok(scraped) => Ok(with_user_note(req, scraped)),
            Err(err) => {
                tracing::warn!("Scraping failed: {}", err);
                match req.text.as_deref() {
                    // Recoverable: analyze the caller's note alone.
                    Some(text) => Ok(format!("User Note: {}\n\n{}", title, text)),
                    None => Err(PipelineError::AcquisitionFailed(err)),
                }
            }
        }
    }

    async fn scrape(&self, url: &str) -> Result<ScrapedContent, ScrapeError> {
        match &self.scraper {
            Some(scraper) => scraper.scrape_markdown(url).await,
            None => Err(ScrapeError::NotConfigured),
        }
    }

    /// Send the text blob to the analyzer and parse its strict-JSON reply.
    async fn analyze(&self, content: &str) -> Result<AnalysisResult, PipelineError> {
        tracing::info!("Starting analysis");

        let content = if content.trim().is_empty() {
            "No content"
        } else {
            content
        };

        let now = ist_now().to_rfc3339();
        let system = format!(
            "You are an expert data analysis engine. Analyze the text and extract specific info. \
             Output MUST be valid JSON. \
             Keys: \"title\", \"summary\", \"keywords\" (array), \"emotions\" (array), \
             \"timestamp\" (use {now} if none found), \"source_url\"."
        );

        let (prefix, truncated) = truncate_chars(content, MAX_ANALYSIS_CHARS);
        let user = if truncated {
            format!("Analyze this text:\n---\n{prefix}... (truncated)\n---")
        } else {
            format!("Analyze this text:\n---\n{prefix}\n---")
        };

        let raw = self
            .analyzer
            .complete(&system, &user)
            .await
            .map_err(PipelineError::AnalysisFailed)?;

        let analysis: AnalysisResult = serde_json::from_str(&strip_code_fences(&raw))
            .map_err(|e| {
                PipelineError::AnalysisFailed(anyhow::anyhow!(
                    "analyzer returned invalid JSON: {e}"
                ))
            })?;

        tracing::info!("Analysis complete: emotions={:?}", analysis.emotions);
        Ok(analysis)
    }
}

/// Prepend the caller's note to scraped content; both get analyzed together.
fn with_user_note(req: &ProcessRequest, scraped: ScrapedContent) -> String {
    if req.title.is_none() && req.text.is_none() {
        return scraped.markdown;
    }
    format!(
        "User Note: {} {}\n\nScraped:\n{}",
        req.title.as_deref().unwrap_or_default(),
        req.text.as_deref().unwrap_or_default(),
        scraped.markdown
    )
}

/// Check whether a URL points at the local machine.
fn is_loopback_url(url: &str) -> bool {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            return host.contains("localhost") || host.contains("127.0.0.1");
        }
    }
    // No parseable host (bare "localhost:3000" parses as a scheme): fall
    // back to a substring check so a malformed local URL cannot slip
    // through to the scraper.
    let u = url.to_lowercase();
    u.contains("localhost") || u.contains("127.0.0.1")
}
