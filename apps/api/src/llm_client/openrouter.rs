//! OpenRouter chat-completions provider (secondary slot, OpenAI-compatible).

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ProviderKind, ProviderSettings};
use crate::llm_client::{
    check_settings, preview, send_json, AnalysisProvider, CompletionRequest, LlmClient,
    ProviderError,
};

const APP_TITLE: &str = "Resume Analyzer";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatResponse {
    fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}

pub struct OpenRouterProvider {
    client: LlmClient,
    settings: ProviderSettings,
}

impl OpenRouterProvider {
    pub fn new(client: LlmClient, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    fn url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.endpoint.trim_end_matches('/')
        )
    }

    fn http_request(&self, request: &CompletionRequest<'_>) -> RequestBuilder {
        let builder = self
            .client
            .http()
            .post(self.url())
            .bearer_auth(&self.settings.api_key)
            .header("X-Title", APP_TITLE);

        let builder = match &self.settings.referer {
            Some(referer) => builder.header("HTTP-Referer", referer),
            None => builder,
        };
        builder.json(&build_request(&self.settings.model, request))
    }
}

fn build_request<'a>(model: &'a str, request: &CompletionRequest<'a>) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: request.system,
            },
            ChatMessage {
                role: "user",
                content: request.document_text,
            },
        ],
        temperature: request.temperature,
        max_tokens: request.max_output_tokens,
        response_format: ResponseFormat {
            format_type: "json_object",
        },
    }
}

#[async_trait]
impl AnalysisProvider for OpenRouterProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        check_settings(&self.settings)?;
        info!("Analyzing resume with OpenRouter model {}", self.settings.model);

        let response: ChatResponse =
            send_json(ProviderKind::OpenRouter, self.http_request(request)).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "OpenRouter call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let text = response
            .text()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProviderError::EmptyContent)?;
        debug!("OpenRouter raw response: {}...", preview(text, 100));
        Ok(text.to_string())
    }
}
