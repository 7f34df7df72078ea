//! Normalization agent.
//!
//! Alias-first scanner: walks every line looking for a known parameter
//! alias, then tries three progressively looser row shapes — name +
//! value + unit + printed range, name + value + unit, and bare name +
//! value. When the document prints its own reference range, the agent
//! records a status hint for the validator to cross-check against the
//! static table.

use crate::pipeline::recognition::ExtractedText;
use crate::pipeline::report::ParamStatus;

use super::types::{AgentId, ExtractionAgent, ParameterCandidate};
use super::vocab;

const WITH_RANGE_CONFIDENCE: f32 = 0.85;
const WITH_UNIT_CONFIDENCE: f32 = 0.8;
const BARE_CONFIDENCE: f32 = 0.65;

#[derive(Default)]
pub struct NormalizationAgent;

impl NormalizationAgent {
    pub fn new() -> Self {
        Self
    }
}

fn hint_from_range(value: f64, range: (f64, f64)) -> ParamStatus {
    if value < range.0 {
        ParamStatus::Low
    } else if value > range.1 {
        ParamStatus::High
    } else {
        ParamStatus::Normal
    }
}

impl ExtractionAgent for NormalizationAgent {
    fn id(&self) -> AgentId {
        AgentId::Normalization
    }

    fn extract(&self, text: &ExtractedText) -> Vec<ParameterCandidate> {
        let mut candidates = Vec::new();

        for line in &text.lines {
            if vocab::is_noise_line(&line.text) {
                continue;
            }
            let Some((name, prefix_len)) = vocab::leading_parameter(&line.text) else {
                continue;
            };
            let rest = &line.text[prefix_len..];
            let Some(value) = vocab::extract_value(rest) else {
                continue;
            };

            let unit = vocab::find_unit(rest);
            let range = vocab::extract_range(rest);

            let (confidence, status_hint) = match (&unit, range) {
                (Some(_), Some(r)) => (WITH_RANGE_CONFIDENCE, Some(hint_from_range(value, r))),
                (Some(_), None) => (WITH_UNIT_CONFIDENCE, None),
                (None, Some(r)) => (BARE_CONFIDENCE, Some(hint_from_range(value, r))),
                (None, None) => (BARE_CONFIDENCE, None),
            };

            candidates.push(ParameterCandidate {
                name: name.to_string(),
                value,
                unit,
                raw_text: line.text.clone(),
                source_agent: AgentId::Normalization,
                confidence,
                status_hint,
            });
        }

        tracing::debug!(candidates = candidates.len(), "Normalization agent finished");
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::recognition::RecognitionMethod;

    fn text_of(s: &str) -> ExtractedText {
        ExtractedText::from_single_page(s, RecognitionMethod::LocalOcr, 0.9)
    }

    #[test]
    fn full_row_with_printed_range() {
        let text = text_of("Hemoglobin 9.5 g/dL (12.0 - 16.0)");
        let candidates = NormalizationAgent::new().extract(&text);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Hemoglobin");
        assert_eq!(candidates[0].value, 9.5);
        assert_eq!(candidates[0].unit.as_deref(), Some("g/dL"));
        assert_eq!(candidates[0].status_hint, Some(ParamStatus::Low));
        assert!((candidates[0].confidence - WITH_RANGE_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn high_hint_from_printed_range() {
        let text = text_of("Glucose 140 mg/dL 70 - 100");
        let candidates = NormalizationAgent::new().extract(&text);
        assert_eq!(candidates[0].status_hint, Some(ParamStatus::High));
    }

    #[test]
    fn normal_hint_from_printed_range() {
        let text = text_of("Hemoglobin 13.5 g/dL (12.0 - 16.0)");
        let candidates = NormalizationAgent::new().extract(&text);
        assert_eq!(candidates[0].status_hint, Some(ParamStatus::Normal));
    }

    #[test]
    fn name_value_unit_without_range() {
        let text = text_of("WBC Count 9000 /cumm");
        let candidates = NormalizationAgent::new().extract(&text);
        assert_eq!(candidates[0].status_hint, None);
        assert!((candidates[0].confidence - WITH_UNIT_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn bare_name_value() {
        let text = text_of("MCV 72");
        let candidates = NormalizationAgent::new().extract(&text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, 72.0);
        assert!(candidates[0].unit.is_none());
        assert!((candidates[0].confidence - BARE_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn alias_resolves_to_canonical_name() {
        let text = text_of("Hb 11.2 g/dL");
        let candidates = NormalizationAgent::new().extract(&text);
        assert_eq!(candidates[0].name, "Hemoglobin");
    }

    #[test]
    fn value_less_lines_are_skipped() {
        let text = text_of("Hemoglobin pending");
        assert!(NormalizationAgent::new().extract(&text).is_empty());
    }
}
