use serde::{Deserialize, Serialize};

use crate::pipeline::context::Gender;
use crate::pipeline::recognition::ExtractedText;
use crate::pipeline::report::ParamStatus;

/// Identifies which extraction agent produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Reconstruction,
    Tabular,
    Normalization,
    /// Pre-built candidates parsed from structured (JSON/CSV) input.
    Structured,
}

/// One agent's reading of one parameter. Never mutated after creation;
/// several candidates may name the same logical parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterCandidate {
    /// Canonical name after alias resolution.
    pub name: String,
    pub value: f64,
    pub unit: Option<String>,
    /// Evidence span: the source line(s) the reading came from.
    pub raw_text: String,
    pub source_agent: AgentId,
    pub confidence: f32,
    /// Status derived from a range printed in the document itself.
    /// Cross-check only — the static reference table always wins.
    pub status_hint: Option<ParamStatus>,
}

/// Demographics found in the report header by the reconstruction agent.
/// Consumed only by the validator's banded-range lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtractedDemographics {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

/// An extraction strategy over recognized text. All agents are pure
/// functions of the same immutable input and may run concurrently.
pub trait ExtractionAgent {
    fn id(&self) -> AgentId;
    fn extract(&self, text: &ExtractedText) -> Vec<ParameterCandidate>;
}
