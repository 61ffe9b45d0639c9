use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::chain::ChainError;
use crate::analysis::orchestrator::{AnalysisError, ErrorCategory};
use crate::extraction::{ExtractError, MAX_DOCUMENT_BYTES};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Request body exceeds the upload limit")]
    PayloadTooLarge,

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Analysis(e) => match e {
                AnalysisError::Extraction(ExtractError::EmptyInput) => StatusCode::BAD_REQUEST,
                AnalysisError::Extraction(ExtractError::UnsupportedType { .. }) => {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE
                }
                AnalysisError::Extraction(ExtractError::TooLarge { .. }) => {
                    StatusCode::PAYLOAD_TOO_LARGE
                }
                AnalysisError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AnalysisError::Provider(ChainError::NoProviderConfigured) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                AnalysisError::Provider(_) | AnalysisError::Normalization(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (code, message, stage) = match &self {
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone(), None),
            // Same code and message as a document rejected by the extractor's size check.
            AppError::PayloadTooLarge => {
                let e = AnalysisError::from(ExtractError::TooLarge {
                    size: 0,
                    limit: MAX_DOCUMENT_BYTES,
                });
                tracing::warn!("Document rejected: request body over the upload limit");
                (e.code(), e.user_message(), Some(e.stage()))
            }
            AppError::Analysis(e) => {
                match e.category() {
                    ErrorCategory::Input | ErrorCategory::Extraction => {
                        tracing::warn!("Document rejected: {e}");
                    }
                    ErrorCategory::Provider
                    | ErrorCategory::AggregateProvider
                    | ErrorCategory::Normalization => {
                        tracing::error!("Analysis error: {e}");
                    }
                }
                (e.code(), e.user_message(), Some(e.stage()))
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "stage": stage
            }
        }));

        (status, body).into_response()
    }
}
