//! Provider Selector & Fallback Chain.
//!
//! Two slots, tried in order, each at most once per call:
//! primary → (on any failure) secondary. The secondary is only started
//! after the primary's failure has been observed.

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::normalizer::locate_object;
use crate::config::{ProviderConfig, ProviderKind};
use crate::llm_client::prompts::{MAX_OUTPUT_TOKENS, RESUME_ANALYSIS_SYSTEM, TEMPERATURE};
use crate::llm_client::{AnalysisProvider, CompletionRequest, LlmClient, ProviderError};

/// A failed attempt against one provider.
#[derive(Debug)]
pub struct ProviderFailure {
    pub provider: ProviderKind,
    pub error: ProviderError,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("No analysis provider is configured")]
    NoProviderConfigured,

    #[error("Analysis provider failed ({0})")]
    Provider(ProviderFailure),

    #[error("All analysis providers failed (primary {primary}; secondary {secondary})")]
    AllProvidersFailed {
        primary: ProviderFailure,
        secondary: ProviderFailure,
    },
}

/// Raw text returned by whichever provider answered.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub provider: ProviderKind,
    pub raw: String,
}

pub struct ProviderChain {
    primary: Option<Box<dyn AnalysisProvider>>,
    secondary: Option<Box<dyn AnalysisProvider>>,
}

impl ProviderChain {
    pub fn new(
        primary: Option<Box<dyn AnalysisProvider>>,
        secondary: Option<Box<dyn AnalysisProvider>>,
    ) -> Self {
        Self { primary, secondary }
    }

    pub fn from_config(client: &LlmClient, config: &ProviderConfig) -> Self {
        let (primary, secondary) = client.providers_for(config);
        Self::new(primary, secondary)
    }

    pub async fn invoke_analysis(&self, text: &str) -> Result<ProviderReply, ChainError> {
        let request = CompletionRequest {
            system: RESUME_ANALYSIS_SYSTEM,
            document_text: text,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        };

        let primary_failure = match &self.primary {
            Some(provider) => match attempt(provider.as_ref(), &request).await {
                Ok(reply) => return Ok(reply),
                Err(failure) => Some(failure),
            },
            None => None,
        };

        let Some(secondary) = &self.secondary else {
            return Err(match primary_failure {
                Some(failure) => ChainError::Provider(failure),
                None => ChainError::NoProviderConfigured,
            });
        };

        if let Some(failure) = &primary_failure {
            warn!(
                "Primary provider failed ({failure}), falling back to {}",
                secondary.kind()
            );
        }

        match (attempt(secondary.as_ref(), &request).await, primary_failure) {
            (Ok(reply), _) => Ok(reply),
            (Err(secondary), Some(primary)) => {
                Err(ChainError::AllProvidersFailed { primary, secondary })
            }
            (Err(failure), None) => Err(ChainError::Provider(failure)),
        }
    }
}

/// One attempt: the call itself, then the empty/unparsable reply checks.
/// Schema checks are left to the normalizer.
async fn attempt(
    provider: &dyn AnalysisProvider,
    request: &CompletionRequest<'_>,
) -> Result<ProviderReply, ProviderFailure> {
    let kind = provider.kind();
    let fail = |error| ProviderFailure {
        provider: kind,
        error,
    };

    let raw = provider.complete(request).await.map_err(fail)?;
    if raw.trim().is_empty() {
        return Err(fail(ProviderError::EmptyContent));
    }
    let parses = locate_object(&raw)
        .map(|object| serde_json::from_str::<serde_json::Value>(object).is_ok())
        .unwrap_or(false);
    if !parses {
        warn!("{kind} reply is not a parsable JSON object");
        return Err(fail(ProviderError::InvalidResponse));
    }

    info!("{kind} returned {} characters", raw.len());
    Ok(ProviderReply {
        provider: kind,
        raw,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    pub(crate) const GOOD_REPLY: &str = r#"{"overallScore": 85, "contentScore": 80, "formatScore": 90,
        "keyFindings": [{"type": "positive", "title": "Strong metrics", "description": "Quantified impact."}],
        "detectedSkills": ["Rust"], "recommendedSkills": ["Docker"]}"#;

    /// Scripted provider that records every call.
    pub(crate) struct FakeProvider {
        kind: ProviderKind,
        reply: Option<String>,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        pub(crate) fn answering(kind: ProviderKind, reply: &str) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply: Some(reply.to_string()),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        /// Every call fails as a network-level error would.
        pub(crate) fn failing(kind: ProviderKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply: None,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisProvider for FakeProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push(request.document_text.to_string());
            self.reply.clone().ok_or_else(|| ProviderError::Api {
                status: 503,
                message: "connection reset by peer".to_string(),
            })
        }
    }

    /// Lets a test keep a handle on a provider owned by the chain.
    pub(crate) struct Shared(pub Arc<FakeProvider>);

    #[async_trait]
    impl AnalysisProvider for Shared {
        fn kind(&self) -> ProviderKind {
            self.0.kind()
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
            self.0.complete(request).await
        }
    }

    pub(crate) fn chain(
        primary: Option<&Arc<FakeProvider>>,
        secondary: Option<&Arc<FakeProvider>>,
    ) -> ProviderChain {
        let boxed = |p: &Arc<FakeProvider>| -> Box<dyn AnalysisProvider> {
            Box::new(Shared(Arc::clone(p)))
        };
        ProviderChain::new(primary.map(boxed), secondary.map(boxed))
    }

    #[tokio::test]
    async fn test_primary_success_never_touches_secondary() {
        let primary = FakeProvider::answering(ProviderKind::Gemini, GOOD_REPLY);
        let secondary = FakeProvider::answering(ProviderKind::OpenRouter, GOOD_REPLY);
        let reply = chain(Some(&primary), Some(&secondary))
            .invoke_analysis("resume text")
            .await
            .unwrap();

        assert_eq!(reply.provider, ProviderKind::Gemini);
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_once_with_same_text() {
        let primary = FakeProvider::failing(ProviderKind::Gemini);
        let secondary = FakeProvider::answering(ProviderKind::OpenRouter, GOOD_REPLY);
        let reply = chain(Some(&primary), Some(&secondary))
            .invoke_analysis("the extracted resume")
            .await
            .unwrap();

        assert_eq!(reply.provider, ProviderKind::OpenRouter);
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 1);
        assert_eq!(
            *secondary.seen.lock().unwrap(),
            vec!["the extracted resume".to_string()]
        );
        assert_eq!(*primary.seen.lock().unwrap(), *secondary.seen.lock().unwrap());
    }

    #[tokio::test]
    async fn test_invalid_primary_reply_triggers_fallback() {
        let primary = FakeProvider::answering(ProviderKind::Gemini, "I cannot help with that.");
        let secondary = FakeProvider::answering(ProviderKind::OpenRouter, GOOD_REPLY);
        let reply = chain(Some(&primary), Some(&secondary))
            .invoke_analysis("text")
            .await
            .unwrap();
        assert_eq!(reply.provider, ProviderKind::OpenRouter);
    }

    #[tokio::test]
    async fn test_unparsable_primary_reply_triggers_fallback() {
        let primary =
            FakeProvider::answering(ProviderKind::Gemini, "{overallScore: 85, contentScore: 80}");
        let secondary = FakeProvider::answering(ProviderKind::OpenRouter, GOOD_REPLY);
        let reply = chain(Some(&primary), Some(&secondary))
            .invoke_analysis("text")
            .await
            .unwrap();

        assert_eq!(reply.provider, ProviderKind::OpenRouter);
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_reply_from_only_provider_is_invalid_response() {
        let primary =
            FakeProvider::answering(ProviderKind::Gemini, "```json\n{\"overallScore\": }\n```");
        let err = chain(Some(&primary), None)
            .invoke_analysis("text")
            .await
            .unwrap_err();
        match err {
            ChainError::Provider(failure) => {
                assert!(matches!(failure.error, ProviderError::InvalidResponse));
            }
            other => panic!("expected single provider failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_primary_reply_triggers_fallback() {
        let primary = FakeProvider::answering(ProviderKind::Gemini, "   ");
        let secondary = FakeProvider::answering(ProviderKind::OpenRouter, GOOD_REPLY);
        let reply = chain(Some(&primary), Some(&secondary))
            .invoke_analysis("text")
            .await
            .unwrap();
        assert_eq!(reply.provider, ProviderKind::OpenRouter);
    }

    #[tokio::test]
    async fn test_secondary_only_goes_straight_to_secondary() {
        let secondary = FakeProvider::answering(ProviderKind::OpenRouter, GOOD_REPLY);
        let reply = chain(None, Some(&secondary))
            .invoke_analysis("text")
            .await
            .unwrap();
        assert_eq!(reply.provider, ProviderKind::OpenRouter);
        assert_eq!(secondary.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_provider_configured() {
        let err = chain(None, None).invoke_analysis("text").await.unwrap_err();
        assert!(matches!(err, ChainError::NoProviderConfigured));
    }

    #[tokio::test]
    async fn test_single_configured_provider_failure_is_not_aggregate() {
        let primary = FakeProvider::failing(ProviderKind::Gemini);
        let err = chain(Some(&primary), None)
            .invoke_analysis("text")
            .await
            .unwrap_err();
        match err {
            ChainError::Provider(failure) => {
                assert_eq!(failure.provider, ProviderKind::Gemini);
                assert!(matches!(failure.error, ProviderError::Api { status: 503, .. }));
            }
            other => panic!("expected single provider failure, got {other:?}"),
        }
        assert_eq!(primary.call_count(), 1);
    }

    #[tokio::test]
    async fn test_both_failures_are_kept() {
        let primary = FakeProvider::failing(ProviderKind::Gemini);
        let secondary = FakeProvider::answering(ProviderKind::OpenRouter, "no json here");
        let err = chain(Some(&primary), Some(&secondary))
            .invoke_analysis("text")
            .await
            .unwrap_err();
        match err {
            ChainError::AllProvidersFailed { primary, secondary } => {
                assert_eq!(primary.provider, ProviderKind::Gemini);
                assert_eq!(secondary.provider, ProviderKind::OpenRouter);
                assert!(matches!(secondary.error, ProviderError::InvalidResponse));
            }
            other => panic!("expected aggregate failure, got {other:?}"),
        }
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 1);
    }
}
