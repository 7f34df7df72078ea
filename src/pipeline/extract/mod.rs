//! Redundant parameter extraction.
//!
//! Three independent agents read the same recognized text with different
//! strategies; a consensus merger reconciles their candidates into one
//! record per parameter. Structured (JSON/CSV) input skips the agents and
//! feeds the merger directly.

pub mod merger;
pub mod normalization;
pub mod reconstruction;
pub mod structured;
pub mod tabular;
pub mod types;
pub mod vocab;

pub use merger::merge;
pub use normalization::NormalizationAgent;
pub use reconstruction::ReconstructionAgent;
pub use tabular::TabularAgent;
pub use types::{AgentId, ExtractedDemographics, ExtractionAgent, ParameterCandidate};

/// Errors from parsing structured input documents.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Invalid JSON document: {0}")]
    StructuredJson(#[from] serde_json::Error),

    #[error("Invalid CSV document: {0}")]
    StructuredCsv(String),
}
