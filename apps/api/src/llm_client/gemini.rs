//! Google Gemini `generateContent` provider (primary slot).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ProviderKind, ProviderSettings};
use crate::llm_client::{
    check_settings, preview, send_json, AnalysisProvider, CompletionRequest, LlmClient,
    ProviderError,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        Some(text)
    }
}

pub struct GeminiProvider {
    client: LlmClient,
    settings: ProviderSettings,
}

impl GeminiProvider {
    pub fn new(client: LlmClient, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }
}

/// Gemini receives the instruction and the resume as one user turn.
fn build_request<'a>(request: &CompletionRequest<'_>) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: vec![GeminiPart {
                text: format!("{}\n\n{}", request.system, request.document_text),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        },
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        check_settings(&self.settings)?;
        info!("Analyzing resume with Gemini model {}", self.settings.model);

        let http_request = self
            .client
            .http()
            .post(self.url())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&build_request(request));

        let response: GenerateContentResponse =
            send_json(ProviderKind::Gemini, http_request).await?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={:?}, output_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        let text = response
            .text()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProviderError::EmptyContent)?;
        debug!("Gemini raw response: {}...", preview(&text, 100));
        Ok(text)
    }
}
