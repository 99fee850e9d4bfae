//! Analyzer error types with retry classification.
//!
//! Distinguishes transient errors (may be retried) from permanent ones.
//! Retries are opt-in: the default config performs a single attempt.

use std::time::Duration;

/// Error from an analyzer API call.
#[derive(Debug)]
pub struct AnalyzerError {
    /// The kind of error
    pub kind: AnalyzerErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
    /// Retry delay suggested by the service (Retry-After header)
    pub retry_after: Option<Duration>,
}

impl AnalyzerError {
    /// Classify an HTTP failure status into an error.
    pub fn from_status(status: u16, message: String, retry_after: Option<Duration>) -> Self {
        Self {
            kind: classify_http_status(status),
            status_code: Some(status),
            message,
            retry_after,
        }
    }

    /// Create a network error (connect failure, timeout).
    pub fn network(message: String) -> Self {
        Self {
            kind: AnalyzerErrorKind::Network,
            status_code: None,
            message,
            retry_after: None,
        }
    }

    /// Create a response parse error.
    pub fn parse(message: String) -> Self {
        Self {
            kind: AnalyzerErrorKind::Parse,
            status_code: None,
            message,
            retry_after: None,
        }
    }

    /// Check if this error is transient and may be retried.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// Delay to wait before the given retry attempt.
    ///
    /// Honors a service-provided `retry_after`; otherwise exponential
    /// backoff with deterministic jitter, capped at 60 seconds.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after;
        }

        let base_secs = match self.kind {
            AnalyzerErrorKind::RateLimited => 5,
            AnalyzerErrorKind::Server => 2,
            _ => 1,
        };
        let delay_secs = base_secs * 2u64.saturating_pow(attempt);

        let jitter_range = delay_secs / 4;
        let jitter = if jitter_range > 0 {
            (attempt as u64 * 7) % jitter_range
        } else {
            0
        };

        Duration::from_secs((delay_secs + jitter).min(60))
    }
}

impl std::fmt::Display for AnalyzerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for AnalyzerError {}

/// Classification of analyzer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerErrorKind {
    /// Rate limited (429) - transient
    RateLimited,
    /// Server error (5xx) - transient
    Server,
    /// Client error (remaining 4xx: bad request, auth) - permanent
    Client,
    /// Connection failure or timeout - transient
    Network,
    /// Response did not have the expected shape - permanent
    Parse,
}

impl AnalyzerErrorKind {
    /// Check if this error kind is transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AnalyzerErrorKind::RateLimited | AnalyzerErrorKind::Server | AnalyzerErrorKind::Network
        )
    }
}

impl std::fmt::Display for AnalyzerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzerErrorKind::RateLimited => write!(f, "Rate limited"),
            AnalyzerErrorKind::Server => write!(f, "Server error"),
            AnalyzerErrorKind::Client => write!(f, "Client error"),
            AnalyzerErrorKind::Network => write!(f, "Network error"),
            AnalyzerErrorKind::Parse => write!(f, "Parse error"),
        }
    }
}

/// Map an HTTP status code to an error kind.
pub fn classify_http_status(status: u16) -> AnalyzerErrorKind {
    match status {
        429 => AnalyzerErrorKind::RateLimited,
        500 | 502 | 503 | 504 => AnalyzerErrorKind::Server,
        400..=499 => AnalyzerErrorKind::Client,
        _ => AnalyzerErrorKind::Server,
    }
}

/// Configuration for analyzer retry behavior.
///
/// `max_retries` is 0 by default: every analysis is a single attempt
/// unless the operator opts in via `ANALYZER_MAX_RETRIES`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial one
    pub max_retries: u32,
    /// Maximum total time to spend including retries
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            max_retry_duration: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// A config retrying transient errors up to `max_retries` times.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Check if the given error should be retried under this config.
    pub fn should_retry(&self, error: &AnalyzerError, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(AnalyzerErrorKind::RateLimited.is_transient());
        assert!(AnalyzerErrorKind::Server.is_transient());
        assert!(AnalyzerErrorKind::Network.is_transient());
        assert!(!AnalyzerErrorKind::Client.is_transient());
        assert!(!AnalyzerErrorKind::Parse.is_transient());
    }

    #[test]
    fn http_status_classification() {
        assert_eq!(classify_http_status(429), AnalyzerErrorKind::RateLimited);
        assert_eq!(classify_http_status(500), AnalyzerErrorKind::Server);
        assert_eq!(classify_http_status(503), AnalyzerErrorKind::Server);
        assert_eq!(classify_http_status(400), AnalyzerErrorKind::Client);
        assert_eq!(classify_http_status(401), AnalyzerErrorKind::Client);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let error = AnalyzerError::from_status(429, "too many requests".to_string(), None);

        let delay_0 = error.suggested_delay(0);
        let delay_1 = error.suggested_delay(1);
        let delay_2 = error.suggested_delay(2);
        assert!(delay_1 > delay_0);
        assert!(delay_2 > delay_1);

        assert!(error.suggested_delay(10).as_secs() <= 60);
    }

    #[test]
    fn retry_after_overrides_backoff() {
        let error = AnalyzerError::from_status(
            429,
            "too many requests".to_string(),
            Some(Duration::from_secs(30)),
        );

        assert_eq!(error.suggested_delay(0), Duration::from_secs(30));
        assert_eq!(error.suggested_delay(5), Duration::from_secs(30));
    }

    #[test]
    fn default_config_never_retries() {
        let config = RetryConfig::default();
        let transient = AnalyzerError::network("connection reset".to_string());
        assert!(!config.should_retry(&transient, 0));

        let config = RetryConfig::with_max_retries(2);
        assert!(config.should_retry(&transient, 0));
        assert!(config.should_retry(&transient, 1));
        assert!(!config.should_retry(&transient, 2));
        assert!(!config.should_retry(&AnalyzerError::from_status(401, "bad key".into(), None), 0));
    }
}
