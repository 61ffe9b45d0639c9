//! Axum route handlers for the Resume Analysis API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::models::AnalysisResult;
use crate::analysis::orchestrator::TracingProgress;
use crate::errors::AppError;
use crate::extraction::UploadedDocument;
use crate::state::AppState;

const FILE_FIELD: &str = "file";
const USE_SAMPLE_FIELD: &str = "use_sample";

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub used_sample: bool,
    pub file_name: Option<String>,
    pub result: AnalysisResult,
}

/// Fields pulled out of the multipart body.
#[derive(Debug, Default)]
struct AnalyzeForm {
    document: Option<UploadedDocument>,
    use_sample: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/analyze
///
/// Multipart upload: `file` (application/pdf) and optional `use_sample`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let form = read_form(multipart).await?;
    run_analysis(&state, form).await
}

/// POST /api/v1/resumes/analyze/sample
///
/// Runs the provider chain against the built-in sample resume.
pub async fn handle_analyze_sample(
    State(state): State<AppState>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    run_analysis(
        &state,
        AnalyzeForm {
            document: None,
            use_sample: true,
        },
    )
    .await
}

async fn run_analysis(
    state: &AppState,
    form: AnalyzeForm,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let analysis_id = Uuid::new_v4();
    info!(
        "Starting analysis {analysis_id} (sample: {}, upload: {} bytes)",
        form.use_sample,
        form.document.as_ref().map(|d| d.size()).unwrap_or(0)
    );

    let result = state
        .analyzer
        .analyze(form.document.as_ref(), form.use_sample, &TracingProgress)
        .await?;

    Ok(Json(AnalyzeResponse {
        analysis_id,
        analyzed_at: Utc::now(),
        used_sample: form.use_sample,
        file_name: form.document.and_then(|d| d.file_name),
        result,
    }))
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, AppError> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Malformed multipart body"))?
    {
        match field.name() {
            Some(FILE_FIELD) => {
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let file_name = field.file_name().map(str::to_string);
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "Failed to read upload"))?;

                let document = UploadedDocument::new(content, media_type);
                form.document = Some(match file_name {
                    Some(name) => document.with_file_name(name),
                    None => document,
                });
            }
            Some(USE_SAMPLE_FIELD) => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, "Failed to read field"))?;
                form.use_sample = parse_flag(&value)?;
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Body-limit overruns surface as multipart errors; they are reported as 413.
fn multipart_error(e: MultipartError, context: &str) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(format!("{context}: {e}"))
    }
}

fn parse_flag(value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" | "" => Ok(false),
        other => Err(AppError::Validation(format!(
            "use_sample must be true or false, got '{other}'"
        ))),
    }
}
