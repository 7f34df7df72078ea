//! Output boundary types.
//!
//! Everything the pipeline produces is collected into an `AnalysisReport`
//! that serializes losslessly to JSON for rendering, export, or external
//! LLM enrichment. None of these types are mutated after their producing
//! stage completes.

use serde::{Deserialize, Serialize};

use super::extract::types::ParameterCandidate;

/// Classification of a parameter value against its effective range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamStatus {
    Low,
    Normal,
    High,
    /// No matching reference range or no known unit conversion.
    Unknown,
}

/// The reference range actually applied to a record, after band selection
/// and unit conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub min: f64,
    pub max: f64,
    pub unit: String,
    /// Set when an age/gender band overrode the parameter default.
    pub adjusted_for: Option<String>,
}

/// One validated parameter per canonical name per document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub canonical_name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub reference_range: Option<ResolvedRange>,
    pub status: ParamStatus,
    /// Candidates that lost the consensus tie-break, kept for audit.
    pub supporting_candidates: Vec<ParameterCandidate>,
    /// How many of the three agents reported this parameter.
    pub agent_agreement: usize,
}

impl ParameterRecord {
    pub fn is_abnormal(&self) -> bool {
        matches!(self.status, ParamStatus::Low | ParamStatus::High)
    }
}

/// Severity band shared by the severity model and pattern findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Likelihood {
    Moderate,
    High,
}

/// A correlated-pattern detection, e.g. "Microcytic Anemia".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternFinding {
    pub pattern_id: String,
    pub involved_parameters: Vec<String>,
    pub classification: String,
    pub severity: Severity,
    pub likelihood: Likelihood,
}

/// Which composite risk a score or modifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    Anemia,
    Infection,
    Bleeding,
    Cardiovascular,
    Metabolic,
    Overall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScore {
    pub kind: RiskKind,
    /// Always within [0, 100].
    pub value: f64,
    pub level: RiskLevel,
    pub contributing_factors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A prioritized action item with a mandatory traceability chain:
/// the finding that triggered it, the risk it addresses, and the causal
/// reasoning connecting the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub priority: Priority,
    pub finding: String,
    pub risk: String,
    pub reasoning: String,
    pub actions: Vec<String>,
}

/// A non-fatal degradation recorded instead of aborting the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limitation {
    pub stage: String,
    pub detail: String,
}

impl Limitation {
    pub fn new(stage: &str, detail: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            detail: detail.into(),
        }
    }
}

/// Recognition stage metadata surfaced alongside the results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionSummary {
    pub method: String,
    pub confidence: f32,
    pub low_confidence: bool,
    pub line_count: usize,
}

/// The complete result of one document run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub document_id: uuid::Uuid,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub recognition: Option<RecognitionSummary>,
    pub parameters: Vec<ParameterRecord>,
    pub findings: Vec<PatternFinding>,
    pub risks: Vec<RiskScore>,
    pub recommendations: Vec<Recommendation>,
    pub advanced: Option<super::rules::advanced::AdvancedRiskReport>,
    pub limitations: Vec<Limitation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_bands_are_ordered() {
        assert!(Severity::Mild < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Severe);
    }

    #[test]
    fn priority_sorts_high_last_in_ord() {
        // Synthesizer sorts descending, so High must compare greatest.
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn param_status_serializes_uppercase() {
        let json = serde_json::to_string(&ParamStatus::Unknown).unwrap();
        assert_eq!(json, "\"UNKNOWN\"");
    }

    #[test]
    fn abnormal_covers_low_and_high_only() {
        let mut rec = ParameterRecord {
            canonical_name: "Hemoglobin".into(),
            value: 9.5,
            unit: Some("g/dL".into()),
            reference_range: None,
            status: ParamStatus::Low,
            supporting_candidates: vec![],
            agent_agreement: 2,
        };
        assert!(rec.is_abnormal());
        rec.status = ParamStatus::Unknown;
        assert!(!rec.is_abnormal());
        rec.status = ParamStatus::Normal;
        assert!(!rec.is_abnormal());
    }
}
