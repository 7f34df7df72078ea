//! Tabular agent.
//!
//! Reads only lines that look like table rows (tab, pipe, or wide-space
//! separated) and maps their cells positionally to name / value / unit.
//! Narrower coverage than the reconstruction agent, but far more precise
//! on well-aligned tables, which is exactly where OCR output is cleanest.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::recognition::ExtractedText;

use super::types::{AgentId, ExtractionAgent, ParameterCandidate};
use super::vocab;

const TABULAR_CONFIDENCE: f32 = 0.8;

/// Runs of three or more spaces act as column separators.
static WIDE_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {3,}").unwrap());

#[derive(Default)]
pub struct TabularAgent;

impl TabularAgent {
    pub fn new() -> Self {
        Self
    }
}

/// A line is tabular when it has at least two tab separators, two pipe
/// separators, or two wide-space column gaps.
fn is_tabular_line(line: &str) -> bool {
    line.matches('\t').count() >= 2
        || line.matches('|').count() >= 2
        || WIDE_SPACE_RE.find_iter(line).count() >= 2
}

/// Split a tabular line into trimmed, non-empty cells.
fn split_cells(line: &str) -> Vec<&str> {
    let cells: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else if line.contains('|') {
        line.split('|').collect()
    } else {
        WIDE_SPACE_RE.split(line).collect()
    };
    cells.into_iter().map(str::trim).filter(|c| !c.is_empty()).collect()
}

impl ExtractionAgent for TabularAgent {
    fn id(&self) -> AgentId {
        AgentId::Tabular
    }

    fn extract(&self, text: &ExtractedText) -> Vec<ParameterCandidate> {
        let mut candidates = Vec::new();

        for line in &text.lines {
            if vocab::is_noise_line(&line.text) || !is_tabular_line(&line.text) {
                continue;
            }
            let cells = split_cells(&line.text);
            if cells.len() < 2 {
                continue;
            }

            let Some(name) = vocab::canonical_name(cells[0]) else {
                continue;
            };
            // Value must come from the second cell; positional mapping is
            // what distinguishes this agent from free-text scanning.
            let Some(value) = vocab::extract_value(cells[1]) else {
                continue;
            };
            let unit = cells
                .get(2)
                .and_then(|c| vocab::find_unit(c))
                .or_else(|| vocab::find_unit(cells[1]));

            candidates.push(ParameterCandidate {
                name: name.to_string(),
                value,
                unit,
                raw_text: line.text.clone(),
                source_agent: AgentId::Tabular,
                confidence: TABULAR_CONFIDENCE,
                status_hint: None,
            });
        }

        tracing::debug!(candidates = candidates.len(), "Tabular agent finished");
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
    fn tab_separated_rows() {
        let text = text_of("Hemoglobin\t12.5\tg/dL\t12.0-16.0");
        let candidates = TabularAgent::new().extract(&text);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Hemoglobin");
        assert_eq!(candidates[0].value, 12.5);
        assert_eq!(candidates[0].unit.as_deref(), Some("g/dL"));
        assert!((candidates[0].confidence - TABULAR_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn pipe_separated_rows() {
        let text = text_of("| WBC Count | 9000 | /cumm |");
        let candidates = TabularAgent::new().extract(&text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "WBC Count");
        assert_eq!(candidates[0].value, 9000.0);
    }

    #[test]
    fn wide_space_columns() {
        let text = text_of("Platelet Count     250000     /cumm");
        let candidates = TabularAgent::new().extract(&text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Platelet Count");
        assert_eq!(candidates[0].unit.as_deref(), Some("/cumm"));
    }

    #[test]
    fn prose_lines_are_skipped() {
        let text = text_of("Hemoglobin 12.5 g/dL measured on analyzer");
        assert!(TabularAgent::new().extract(&text).is_empty());
    }

    #[test]
    fn unknown_name_cell_is_skipped() {
        let text = text_of("Specimen Id\tABC-123\tnone");
        assert!(TabularAgent::new().extract(&text).is_empty());
    }

    #[test]
    fn unit_falls_back_to_value_cell() {
        let text = text_of("Hemoglobin\t12.5 g/dL\t12.0-16.0");
        let candidates = TabularAgent::new().extract(&text);
        assert_eq!(candidates[0].unit.as_deref(), Some("g/dL"));
    }

    #[test]
    fn raw_text_keeps_the_line_verbatim() {
        let line = "Hemoglobin\t12.5\tg/dL";
        let candidates = TabularAgent::new().extract(&text_of(line));
        assert_eq!(candidates[0].raw_text, line);
    }
}
