//! Configuration management for mindvault.
//!
//! Configuration is set via environment variables:
//! - `MISTRAL_API_KEY` - Required. Credential for the analyzer.
//! - `ANALYZER_MODEL` - Optional. Chat model id. Defaults to `mistral-small-latest`.
//! - `ANALYZER_MAX_RETRIES` - Optional. Retries for transient analyzer errors. Defaults to `0`.
//! - `FIRECRAWL_API_KEY` - Optional. Credential for the scraper; unset disables scraping.
//! - `SCRAPE_TIMEOUT_SECS` - Optional. Bound on a single scrape. Defaults to `60`.
//! - `SUPABASE_URL` - Optional. Store endpoint; unset leaves the store unavailable.
//! - `SUPABASE_SERVICE_ROLE_KEY` - Optional. Store credential.
//! - `MEMORIES_TABLE` - Optional. Store collection name. Defaults to `memories`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.

use thiserror::Error;

use crate::scrape::DEFAULT_SCRAPE_TIMEOUT_SECS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Analyzer collaborator configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Mistral API key
    pub api_key: String,

    /// Chat model identifier
    pub model: String,

    /// Retries for transient errors (0 = single attempt)
    pub max_retries: u32,
}

/// Scraper collaborator configuration.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Firecrawl API key; `None` disables scraping
    pub api_key: Option<String>,

    /// Bound on a single scrape request, in seconds
    pub timeout_secs: u64,
}

/// Store collaborator configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Supabase project URL
    pub url: Option<String>,

    /// Supabase service role key (for full access)
    pub service_role_key: Option<String>,

    /// Collection the records are inserted into
    pub table: String,
}

impl StoreConfig {
    /// Check if the store is configured.
    pub fn is_enabled(&self) -> bool {
        self.url.is_some() && self.service_role_key.is_some()
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Analyzer collaborator
    pub analyzer: AnalyzerConfig,

    /// Scraper collaborator
    pub scrape: ScrapeConfig,

    /// Store collaborator
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `MISTRAL_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("MISTRAL_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("MISTRAL_API_KEY".to_string()))?;

        let model = std::env::var("ANALYZER_MODEL")
            .unwrap_or_else(|_| "mistral-small-latest".to_string());

        let max_retries = parse_env_or("ANALYZER_MAX_RETRIES", 0)?;

        let analyzer = AnalyzerConfig {
            api_key,
            model,
            max_retries,
        };

        let scrape = ScrapeConfig {
            api_key: std::env::var("FIRECRAWL_API_KEY").ok(),
            timeout_secs: parse_env_or("SCRAPE_TIMEOUT_SECS", DEFAULT_SCRAPE_TIMEOUT_SECS)?,
        };

        let store = StoreConfig {
            url: std::env::var("SUPABASE_URL").ok(),
            service_role_key: std::env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
            table: std::env::var("MEMORIES_TABLE").unwrap_or_else(|_| "memories".to_string()),
        };

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_env_or("PORT", 8000)?;

        Ok(Self {
            host,
            port,
            analyzer,
            scrape,
            store,
        })
    }
}

fn parse_env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}
