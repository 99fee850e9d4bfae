//! Analyzer client module for the language-model collaborator.
//!
//! One capability seam: [`CompletionClient::complete`] takes a system
//! instruction and a user message and returns the model's text. The
//! concrete implementation is chosen once at startup; no provider
//! branching reaches pipeline logic.

mod error;
mod mistral;

pub use error::{classify_http_status, AnalyzerError, AnalyzerErrorKind, RetryConfig};
pub use mistral::MistralClient;

use async_trait::async_trait;

/// Trait for chat-completion clients.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a system instruction plus one user message, return the
    /// model's response text.
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String>;
}
