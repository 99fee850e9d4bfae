//! Mistral chat-completions client with opt-in retry for transient errors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::error::{AnalyzerError, RetryConfig};
use super::CompletionClient;

const MISTRAL_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";

/// Low temperature keeps the extraction deterministic.
const ANALYSIS_TEMPERATURE: f64 = 0.2;

/// Mistral API client.
pub struct MistralClient {
    client: Client,
    api_key: String,
    model: String,
    retry_config: RetryConfig,
}

impl MistralClient {
    /// Create a new client with the default (no-retry) configuration.
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_retry_config(api_key, model, RetryConfig::default())
    }

    /// Create a new client with a custom retry configuration.
    pub fn with_retry_config(api_key: String, model: String, retry_config: RetryConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            retry_config,
        }
    }

    /// Parse Retry-After header if present (seconds form only).
    fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok().map(Duration::from_secs))
    }

    /// Execute a single request without retry.
    async fn execute_request(
        &self,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<String, AnalyzerError> {
        let response = match self
            .client
            .post(MISTRAL_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Err(AnalyzerError::network(format!("Request timeout: {}", e)));
            }
            Err(e) if e.is_connect() => {
                return Err(AnalyzerError::network(format!("Connection failed: {}", e)));
            }
            Err(e) => {
                return Err(AnalyzerError::network(format!("Request failed: {}", e)));
            }
        };

        let status = response.status();
        let retry_after = Self::parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AnalyzerError::from_status(status.as_u16(), body, retry_after));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            AnalyzerError::parse(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AnalyzerError::parse("No choices in response".to_string()))?;

        choice
            .message
            .content
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AnalyzerError::parse("Empty message content in response".to_string()))
    }

    /// Execute a request, retrying transient errors per the retry config.
    async fn execute_with_retry(
        &self,
        request: &ChatCompletionRequest<'_>,
    ) -> anyhow::Result<String> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            match self.execute_request(request).await {
                Ok(text) => {
                    if attempt > 0 {
                        tracing::info!(
                            "Analysis request succeeded after {} retries (total time: {:?})",
                            attempt,
                            start.elapsed()
                        );
                    }
                    return Ok(text);
                }
                Err(error) => {
                    if !self.retry_config.should_retry(&error, attempt) {
                        tracing::error!("Analysis request failed (not retrying): {}", error);
                        return Err(anyhow::anyhow!("{}", error));
                    }

                    let delay = error.suggested_delay(attempt);
                    let remaining = self
                        .retry_config
                        .max_retry_duration
                        .saturating_sub(start.elapsed());
                    let actual_delay = delay.min(remaining);

                    if actual_delay.is_zero() {
                        tracing::warn!(
                            "Retry attempt {} failed, no time remaining: {}",
                            attempt + 1,
                            error
                        );
                        return Err(anyhow::anyhow!("{}", error));
                    }

                    tracing::warn!(
                        "Retry attempt {} failed with {}, retrying in {:?}: {}",
                        attempt + 1,
                        error.kind,
                        actual_delay,
                        error.message
                    );

                    tokio::time::sleep(actual_delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl CompletionClient for MistralClient {
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            temperature: ANALYSIS_TEMPERATURE,
            response_format: ResponseFormat {
                format: "json_object",
            },
            messages: vec![
                WireMessage {
                    role: "system",
                    content: system,
                },
                WireMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        tracing::debug!("Sending analysis request to Mistral: model={}", self.model);

        self.execute_with_retry(&request).await
    }
}

/// Mistral chat-completions request format.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f64,
    response_format: ResponseFormat,
    messages: Vec<WireMessage<'a>>,
}

/// Forces strict-JSON output from the model.
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format: &'static str,
}

/// A message in the chat request.
#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Mistral chat-completions response format.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

/// Message in a response choice.
#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_json_object_format() {
        let request = ChatCompletionRequest {
            model: "mistral-small-latest",
            temperature: ANALYSIS_TEMPERATURE,
            response_format: ResponseFormat {
                format: "json_object",
            },
            messages: vec![WireMessage {
                role: "system",
                content: "extract",
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "mistral-small-latest");
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "system");
    }

    #[test]
    fn response_parses_first_choice_content() {
        let body = r#"{
            "id": "cmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"title\": \"x\"}"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;

        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let content = parsed.choices.into_iter().next().unwrap().message.content;
        assert_eq!(content.as_deref(), Some("{\"title\": \"x\"}"));
    }
}
