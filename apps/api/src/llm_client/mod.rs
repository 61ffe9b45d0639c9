//! LLM Client: the single point of entry for all remote analysis provider calls.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! All provider interactions MUST go through an `AnalysisProvider` from this module.
//!
//! Every call is a single request/response. Retries and fallback are decided by
//! the caller (see `analysis::chain`), never here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::warn;

use crate::config::{ProviderConfig, ProviderKind, ProviderSettings};

pub mod gemini;
pub mod openrouter;
pub mod prompts;

pub use gemini::GeminiProvider;
pub use openrouter::OpenRouterProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider initialization failed: {0}")]
    Initialization(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid API key (status {status})")]
    Unauthorized { status: u16 },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Provider returned empty content")]
    EmptyContent,

    #[error("Provider response contains no JSON object")]
    InvalidResponse,
}

/// One analysis request, identical for every provider.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub document_text: &'a str,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// A remote text-generation service that can run the resume analysis prompt.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Sends exactly one request and returns the raw text of the reply.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError>;
}

/// Shared HTTP client for every provider.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
}

impl LlmClient {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Builds the provider for a configured slot.
    pub fn provider_for(&self, settings: &ProviderSettings) -> Box<dyn AnalysisProvider> {
        match settings.kind {
            ProviderKind::Gemini => Box::new(GeminiProvider::new(self.clone(), settings.clone())),
            ProviderKind::OpenRouter => {
                Box::new(OpenRouterProvider::new(self.clone(), settings.clone()))
            }
        }
    }

    /// Builds primary and secondary providers from configuration.
    pub fn providers_for(
        &self,
        config: &ProviderConfig,
    ) -> (
        Option<Box<dyn AnalysisProvider>>,
        Option<Box<dyn AnalysisProvider>>,
    ) {
        (
            config.primary.as_ref().map(|s| self.provider_for(s)),
            config.secondary.as_ref().map(|s| self.provider_for(s)),
        )
    }
}

/// Error body shape shared by Gemini and OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Sends a prepared request once and decodes a successful JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: ProviderKind,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("{provider} API returned {status}");
        return Err(classify_status(status.as_u16(), &body));
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

fn classify_status(status: u16, body: &str) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Unauthorized { status },
        429 => ProviderError::RateLimited,
        _ => {
            let message = serde_json::from_str::<ApiErrorEnvelope>(body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.to_string());
            ProviderError::Api { status, message }
        }
    }
}

/// Rejects blank credentials or model identifiers before any request is sent.
pub(crate) fn check_settings(settings: &ProviderSettings) -> Result<(), ProviderError> {
    if settings.api_key.trim().is_empty() {
        return Err(ProviderError::Initialization(format!(
            "{} API key is empty",
            settings.kind
        )));
    }
    if settings.model.trim().is_empty() {
        return Err(ProviderError::Initialization(format!(
            "{} model identifier is empty",
            settings.kind
        )));
    }
    Ok(())
}

/// Returns the first `chars` characters, for log previews.
pub(crate) fn preview(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(kind: ProviderKind, api_key: &str, model: &str) -> ProviderSettings {
        ProviderSettings {
            kind,
            api_key: api_key.to_string(),
            endpoint: "http://localhost".to_string(),
            model: model.to_string(),
            referer: None,
        }
    }

    #[test]
    fn test_unauthorized_statuses() {
        assert!(matches!(
            classify_status(401, ""),
            ProviderError::Unauthorized { status: 401 }
        ));
        assert!(matches!(
            classify_status(403, ""),
            ProviderError::Unauthorized { status: 403 }
        ));
    }

    #[test]
    fn test_rate_limited_status() {
        assert!(matches!(classify_status(429, "slow down"), ProviderError::RateLimited));
    }

    #[test]
    fn test_error_message_taken_from_json_body() {
        let body = r#"{"error": {"message": "model overloaded", "code": 503}}"#;
        match classify_status(503, body) {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "model overloaded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        match classify_status(500, "upstream exploded") {
            ProviderError::Api { message, .. } => assert_eq!(message, "upstream exploded"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_settings_fail_initialization() {
        assert!(matches!(
            check_settings(&settings(ProviderKind::Gemini, " ", "m")),
            Err(ProviderError::Initialization(_))
        ));
        assert!(matches!(
            check_settings(&settings(ProviderKind::OpenRouter, "k", "")),
            Err(ProviderError::Initialization(_))
        ));
        assert!(check_settings(&settings(ProviderKind::Gemini, "k", "m")).is_ok());
    }

    #[test]
    fn test_providers_follow_slot_kinds() {
        let client = LlmClient::new(Duration::from_secs(5)).unwrap();
        let config = ProviderConfig {
            primary: Some(settings(ProviderKind::Gemini, "k", "m")),
            secondary: None,
            request_timeout: Duration::from_secs(5),
        };
        let (primary, secondary) = client.providers_for(&config);
        assert_eq!(primary.unwrap().kind(), ProviderKind::Gemini);
        assert!(secondary.is_none());
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("héllo wörld", 4), "héll");
    }
}
