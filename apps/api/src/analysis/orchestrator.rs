//! Analysis Orchestrator: the single entry point of the analysis pipeline.
//!
//! Flow: extract text (or substitute the sample) → provider chain → normalize.
//! Per call: Idle → Extracting → Invoking → Normalizing → Done, or Failed at
//! the first error. Nothing is retried and nothing falls back to sample data.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::chain::{ChainError, ProviderChain};
use crate::analysis::models::{AnalysisResult, FindingKind};
use crate::analysis::normalizer::{parse_result, NormalizationError};
use crate::analysis::sample::SAMPLE_RESUME_TEXT;
use crate::config::ProviderKind;
use crate::extraction::{ExtractError, TextExtractor, UploadedDocument};
use crate::llm_client::ProviderError;

/// Working stage of a call. A call that returns `Ok` is done; one that
/// returns `Err` failed in the stage its error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Extracting,
    Invoking,
    Normalizing,
}

/// Coarse error kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Extraction,
    Provider,
    AggregateProvider,
    Normalization,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Provider(#[from] ChainError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

impl AnalysisError {
    /// Stage the pipeline was in when it failed.
    pub fn stage(&self) -> AnalysisStage {
        match self {
            AnalysisError::Extraction(_) => AnalysisStage::Extracting,
            AnalysisError::Provider(_) => AnalysisStage::Invoking,
            AnalysisError::Normalization(_) => AnalysisStage::Normalizing,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalysisError::Extraction(e) if e.is_input_error() => ErrorCategory::Input,
            AnalysisError::Extraction(_) => ErrorCategory::Extraction,
            AnalysisError::Provider(ChainError::AllProvidersFailed { .. }) => {
                ErrorCategory::AggregateProvider
            }
            AnalysisError::Provider(_) => ErrorCategory::Provider,
            AnalysisError::Normalization(_) => ErrorCategory::Normalization,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::Extraction(e) => match e {
                ExtractError::EmptyInput => "EMPTY_INPUT",
                ExtractError::UnsupportedType { .. } => "UNSUPPORTED_TYPE",
                ExtractError::TooLarge { .. } => "TOO_LARGE",
                ExtractError::Timeout(_) => "EXTRACTION_TIMEOUT",
                ExtractError::PasswordProtected => "PASSWORD_PROTECTED",
                ExtractError::CorruptDocument(_) => "CORRUPT_DOCUMENT",
                ExtractError::LikelyScannedDocument { .. } => "LIKELY_SCANNED_DOCUMENT",
            },
            AnalysisError::Provider(e) => match e {
                ChainError::NoProviderConfigured => "NO_PROVIDER_CONFIGURED",
                ChainError::Provider(_) => "PROVIDER_FAILED",
                ChainError::AllProvidersFailed { .. } => "ALL_PROVIDERS_FAILED",
            },
            AnalysisError::Normalization(_) => "MALFORMED_RESPONSE",
        }
    }

    /// Message suitable for showing to the person who uploaded the resume.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Extraction(e) => match e {
                ExtractError::EmptyInput => "No file provided.".to_string(),
                ExtractError::UnsupportedType { .. } => "Please upload a PDF file.".to_string(),
                ExtractError::TooLarge { .. } => {
                    "PDF file is too large. Please upload a smaller file (max 15MB).".to_string()
                }
                ExtractError::Timeout(_) => {
                    "PDF processing took too long. The file might be too complex or large."
                        .to_string()
                }
                ExtractError::PasswordProtected => {
                    "The PDF appears to be password-protected. Please upload an unprotected PDF."
                        .to_string()
                }
                ExtractError::CorruptDocument(_) => {
                    "Failed to extract text from the PDF. The file may be corrupted.".to_string()
                }
                ExtractError::LikelyScannedDocument { .. } => {
                    "The PDF appears to be scanned or contains very little extractable text. \
                     Please use a PDF that was created digitally and contains selectable text."
                        .to_string()
                }
            },
            AnalysisError::Provider(e) => match e {
                ChainError::NoProviderConfigured => {
                    "No API keys configured. Please configure a Gemini or OpenRouter API key."
                        .to_string()
                }
                ChainError::Provider(failure) => match &failure.error {
                    ProviderError::Unauthorized { .. } => format!(
                        "Invalid {} API key. Please check your API key and try again.",
                        failure.provider
                    ),
                    ProviderError::RateLimited => format!(
                        "{} API rate limit exceeded. Please try again later.",
                        failure.provider
                    ),
                    other => format!(
                        "Failed to analyze resume with {}: {other}",
                        failure.provider
                    ),
                },
                ChainError::AllProvidersFailed { primary, secondary } => format!(
                    "Failed to analyze resume with both {} and {}. \
                     Please check your API keys and try again.",
                    primary.provider, secondary.provider
                ),
            },
            AnalysisError::Normalization(_) => {
                "Failed to parse the analysis response. Please try again.".to_string()
            }
        }
    }
}

/// Advisory progress milestones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    ExtractionStarted,
    ExtractionFinished {
        chars: usize,
        pages: usize,
        truncated: bool,
    },
    ExtractionSkipped,
    ProviderStarted,
    ProviderFinished { provider: ProviderKind },
    NormalizationFinished,
    Failed { stage: AnalysisStage },
}

pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Discards every event.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Writes each milestone to the log.
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Failed { stage } => warn!("Analysis failed during {:?}", stage),
            other => debug!("Analysis progress: {:?}", other),
        }
    }
}

pub struct Analyzer {
    extractor: TextExtractor,
    chain: ProviderChain,
}

impl Analyzer {
    pub fn new(extractor: TextExtractor, chain: ProviderChain) -> Self {
        Self { extractor, chain }
    }

    /// Runs the full pipeline for one document, or for the built-in sample.
    ///
    /// `use_sample` skips extraction and all document validation.
    pub async fn analyze(
        &self,
        doc: Option<&UploadedDocument>,
        use_sample: bool,
        progress: &dyn ProgressObserver,
    ) -> Result<AnalysisResult, AnalysisError> {
        let outcome = self.run(doc, use_sample, progress).await;
        if let Err(e) = &outcome {
            progress.on_progress(&ProgressEvent::Failed { stage: e.stage() });
        }
        outcome
    }

    async fn run(
        &self,
        doc: Option<&UploadedDocument>,
        use_sample: bool,
        progress: &dyn ProgressObserver,
    ) -> Result<AnalysisResult, AnalysisError> {
        let extracted;
        let text = if use_sample {
            info!("Using built-in sample resume");
            progress.on_progress(&ProgressEvent::ExtractionSkipped);
            SAMPLE_RESUME_TEXT
        } else {
            progress.on_progress(&ProgressEvent::ExtractionStarted);
            let doc = doc.ok_or(ExtractError::EmptyInput)?;
            extracted = self.extractor.extract_text(doc).await?;
            progress.on_progress(&ProgressEvent::ExtractionFinished {
                chars: extracted.char_count(),
                pages: extracted.pages_processed,
                truncated: extracted.is_truncated(),
            });
            extracted.as_str()
        };

        progress.on_progress(&ProgressEvent::ProviderStarted);
        let reply = self.chain.invoke_analysis(text).await?;
        progress.on_progress(&ProgressEvent::ProviderFinished {
            provider: reply.provider,
        });

        let result = parse_result(&reply.raw)?;
        progress.on_progress(&ProgressEvent::NormalizationFinished);
        debug!(
            "Findings: {} positive, {} negative, {} suggestions",
            result.findings_of(FindingKind::Positive).count(),
            result.findings_of(FindingKind::Negative).count(),
            result.findings_of(FindingKind::Suggestion).count()
        );

        info!(
            "Analysis complete via {}: overall score {}",
            reply.provider, result.overall_score
        );
        Ok(result)
    }
}
