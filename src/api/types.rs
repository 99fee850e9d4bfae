//! API response types.
//!
//! The `/receive_data` request body deserializes directly into
//! [`crate::pipeline::ProcessRequest`]; successful runs answer with the
//! pipeline's own outcome shape.

use serde::Serialize;

/// Body returned for propagated pipeline failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Liveness probe response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    /// Whether the store is configured; captures are rejected without it.
    pub store_ready: bool,

    /// Whether the scraper is configured; captures degrade to user notes
    /// without it.
    pub scraper_ready: bool,
}
