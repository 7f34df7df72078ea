//! Reconstruction agent.
//!
//! Scanned tables frequently split a parameter name from its value across
//! line breaks. This agent drops noise lines, then, when an anchor line
//! has no numeric value, pulls in up to `MAX_CONTINUATION_LINES` following
//! lines (stopping at the next anchor) before reading value and unit.
//! It also harvests age/gender from the report header as a side output
//! for the validator's banded-range lookup.

use crate::pipeline::recognition::ExtractedText;

use super::types::{AgentId, ExtractedDemographics, ExtractionAgent, ParameterCandidate};
use super::vocab;

/// How many lines after an anchor may be merged while hunting the value.
const MAX_CONTINUATION_LINES: usize = 3;

/// Confidence when name and value sat on the same line.
const SAME_LINE_CONFIDENCE: f32 = 0.9;

/// Confidence when the row had to be reconstructed across lines.
const RECONSTRUCTED_CONFIDENCE: f32 = 0.75;

#[derive(Default)]
pub struct ReconstructionAgent;

impl ReconstructionAgent {
    pub fn new() -> Self {
        Self
    }

    /// Full extraction including the demographic side output.
    pub fn extract_with_demographics(
        &self,
        text: &ExtractedText,
    ) -> (Vec<ParameterCandidate>, ExtractedDemographics) {
        let lines: Vec<&str> = text
            .lines
            .iter()
            .map(|l| l.text.as_str())
            .filter(|l| !vocab::is_noise_line(l))
            .collect();

        let demographics = ExtractedDemographics {
            age: lines.iter().find_map(|l| vocab::extract_age(l)),
            gender: lines.iter().find_map(|l| vocab::extract_gender(l)),
        };

        let mut candidates = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let Some((name, prefix_len)) = vocab::leading_parameter(lines[i]) else {
                i += 1;
                continue;
            };

            let mut window = lines[i][prefix_len..].to_string();
            let mut consumed = 0;

            // Reconstruct the row: pull continuation lines until a value
            // appears, the next anchor starts, or the budget runs out.
            while vocab::extract_value(&window).is_none() && consumed < MAX_CONTINUATION_LINES {
                let next = i + consumed + 1;
                if next >= lines.len() || vocab::leading_parameter(lines[next]).is_some() {
                    break;
                }
                window.push(' ');
                window.push_str(lines[next]);
                consumed += 1;
            }

            if let Some(value) = vocab::extract_value(&window) {
                let raw_text = if consumed == 0 {
                    lines[i].to_string()
                } else {
                    lines[i..=i + consumed].join(" ")
                };
                candidates.push(ParameterCandidate {
                    name: name.to_string(),
                    value,
                    unit: vocab::find_unit(&window),
                    raw_text,
                    source_agent: AgentId::Reconstruction,
                    confidence: if consumed == 0 {
                        SAME_LINE_CONFIDENCE
                    } else {
                        RECONSTRUCTED_CONFIDENCE
                    },
                    status_hint: None,
                });
            }

            i += consumed + 1;
        }

        tracing::debug!(
            candidates = candidates.len(),
            age = ?demographics.age,
            "Reconstruction agent finished"
        );
        (candidates, demographics)
    }
}

impl ExtractionAgent for ReconstructionAgent {
    fn id(&self) -> AgentId {
        AgentId::Reconstruction
    }

    fn extract(&self, text: &ExtractedText) -> Vec<ParameterCandidate> {
        self.extract_with_demographics(text).0
    }
}
