use serde::{Deserialize, Serialize};

/// Category of a single piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Positive,
    Negative,
    Suggestion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub title: String,
    pub description: String,
}

/// Structured ATS-style analysis. Scores are nominally 0–100 and are
/// passed through exactly as the provider produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub overall_score: f64,
    pub content_score: f64,
    pub format_score: f64,
    #[serde(default)]
    pub key_findings: Vec<Finding>,
    #[serde(default)]
    pub detected_skills: Vec<String>,
    #[serde(default)]
    pub recommended_skills: Vec<String>,
}

impl AnalysisResult {
    pub fn findings_of(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.key_findings.iter().filter(move |f| f.kind == kind)
    }

    /// Names of score fields outside 0–100.
    pub fn out_of_range_scores(&self) -> Vec<&'static str> {
        [
            ("overallScore", self.overall_score),
            ("contentScore", self.content_score),
            ("formatScore", self.format_score),
        ]
        .into_iter()
        .filter(|(_, score)| !(0.0..=100.0).contains(score))
        .map(|(name, _)| name)
        .collect()
    }
}
