//! Result Normalizer: pulls the JSON object out of a provider reply and
//! parses it into `AnalysisResult`.
//!
//! Providers are told to emit bare JSON, but some wrap it in prose or code
//! fences. The first balanced top-level `{...}` is taken as the payload.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::analysis::models::AnalysisResult;

const REQUIRED_SCORES: [&str; 3] = ["overallScore", "contentScore", "formatScore"];

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("Response contains no JSON object")]
    NoJsonObject,

    #[error("Response JSON is invalid: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Response is missing numeric field '{0}'")]
    MissingField(&'static str),
}

/// Parses a raw provider reply into the fixed result schema.
pub fn parse_result(raw: &str) -> Result<AnalysisResult, NormalizationError> {
    let object = locate_object(raw).ok_or(NormalizationError::NoJsonObject)?;
    let value: Value = serde_json::from_str(object)?;

    for field in REQUIRED_SCORES {
        if !value.get(field).map(Value::is_number).unwrap_or(false) {
            return Err(NormalizationError::MissingField(field));
        }
    }

    let result: AnalysisResult = serde_json::from_value(value)?;

    let out_of_range = result.out_of_range_scores();
    if !out_of_range.is_empty() {
        warn!("Provider returned scores outside 0-100: {:?}", out_of_range);
    }

    Ok(result)
}

/// Returns the first balanced top-level `{...}` slice of `raw`.
///
/// Braces inside JSON string literals (including escaped quotes) do not count.
pub fn locate_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::{Finding, FindingKind};

    const WELL_FORMED: &str = r#"{
        "overallScore": 85,
        "contentScore": 88,
        "formatScore": 82,
        "keyFindings": [
            {"type": "positive", "title": "Quantified achievements", "description": "Metrics back up most bullets."},
            {"type": "negative", "title": "Dense layout", "description": "Two-column sections may confuse parsers."},
            {"type": "suggestion", "title": "Add a summary", "description": "Open with a short professional summary."}
        ],
        "detectedSkills": ["Rust", "PostgreSQL", "Kubernetes"],
        "recommendedSkills": ["Terraform", "gRPC"]
    }"#;

    #[test]
    fn test_parses_well_formed_response() {
        let result = parse_result(WELL_FORMED).unwrap();
        assert_eq!(result.overall_score, 85.0);
        assert_eq!(result.content_score, 88.0);
        assert_eq!(result.format_score, 82.0);
        assert_eq!(result.key_findings.len(), 3);
        assert_eq!(result.key_findings[1].kind, FindingKind::Negative);
        assert_eq!(result.detected_skills, vec!["Rust", "PostgreSQL", "Kubernetes"]);
        assert_eq!(result.recommended_skills.len(), 2);
    }

    #[test]
    fn test_tolerates_prose_around_object() {
        let raw = format!(
            "Sure! Here is the analysis you asked for:\n{}\nLet me know if you need anything else {{or more}}.",
            WELL_FORMED
        );
        let result = parse_result(&raw).unwrap();
        assert_eq!(result.overall_score, 85.0);
        assert_eq!(result.key_findings.len(), 3);
    }

    #[test]
    fn test_tolerates_code_fences() {
        let raw = format!("```json\n{}\n```", WELL_FORMED);
        assert_eq!(parse_result(&raw).unwrap().format_score, 82.0);
    }

    #[test]
    fn test_canonical_form_round_trips_to_equal_result() {
        let original = AnalysisResult {
            overall_score: 72.5,
            content_score: 70.0,
            format_score: 75.0,
            key_findings: vec![Finding {
                kind: FindingKind::Suggestion,
                title: "Use {consistent} dates".to_string(),
                description: "Quote \"MM/YYYY\" everywhere }".to_string(),
            }],
            detected_skills: vec!["Go".to_string()],
            recommended_skills: vec!["Rust".to_string()],
        };
        let canonical = serde_json::to_string(&original).unwrap();
        let parsed = parse_result(&canonical).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parse_result(&serde_json::to_string(&parsed).unwrap()).unwrap(), parsed);
    }

    #[test]
    fn test_no_object_is_rejected() {
        assert!(matches!(
            parse_result("I could not analyze this document."),
            Err(NormalizationError::NoJsonObject)
        ));
    }

    #[test]
    fn test_unbalanced_object_is_rejected() {
        assert!(matches!(
            parse_result(r#"{"overallScore": 80, "contentScore": 70"#),
            Err(NormalizationError::NoJsonObject)
        ));
    }

    #[test]
    fn test_missing_score_is_rejected() {
        let raw = r#"{"overallScore": 80, "formatScore": 70, "keyFindings": []}"#;
        assert!(matches!(
            parse_result(raw),
            Err(NormalizationError::MissingField("contentScore"))
        ));
    }

    #[test]
    fn test_string_score_is_rejected() {
        let raw = r#"{"overallScore": "80", "contentScore": 70, "formatScore": 70}"#;
        assert!(matches!(
            parse_result(raw),
            Err(NormalizationError::MissingField("overallScore"))
        ));
    }

    #[test]
    fn test_unknown_finding_type_is_invalid() {
        let raw = r#"{"overallScore": 80, "contentScore": 70, "formatScore": 70,
            "keyFindings": [{"type": "neutral", "title": "t", "description": "d"}]}"#;
        assert!(matches!(parse_result(raw), Err(NormalizationError::InvalidJson(_))));
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let raw = r#"{"overallScore": 40, "contentScore": 30, "formatScore": 50}"#;
        let result = parse_result(raw).unwrap();
        assert!(result.key_findings.is_empty());
        assert!(result.detected_skills.is_empty());
        assert!(result.recommended_skills.is_empty());
    }

    #[test]
    fn test_scores_are_not_clamped() {
        let raw = r#"{"overallScore": 140, "contentScore": -5, "formatScore": 100}"#;
        let result = parse_result(raw).unwrap();
        assert_eq!(result.overall_score, 140.0);
        assert_eq!(result.content_score, -5.0);
    }

    #[test]
    fn test_locate_object_takes_first_top_level_object() {
        let raw = r#"prefix {"a": {"b": 1}} middle {"c": 2} suffix"#;
        assert_eq!(locate_object(raw), Some(r#"{"a": {"b": 1}}"#));
    }

    #[test]
    fn test_locate_object_ignores_braces_in_strings() {
        let raw = r#"{"title": "odd } brace \" and { more", "n": 1} trailing }"#;
        assert_eq!(
            locate_object(raw),
            Some(r#"{"title": "odd } brace \" and { more", "n": 1}"#)
        );
    }

    #[test]
    fn test_locate_object_handles_multibyte_text() {
        let raw = "Résumé → {\"skill\": \"Déploiement\"} fin";
        assert_eq!(locate_object(raw), Some("{\"skill\": \"Déploiement\"}"));
    }
}
