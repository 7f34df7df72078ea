//! Structured-input parser.
//!
//! JSON and CSV documents bypass recognition and extraction entirely:
//! their readings are authoritative, so they are parsed directly into
//! candidates and handed to the merger as a single high-confidence
//! source. Names still go through alias resolution; readings the
//! vocabulary does not know are kept under their raw name so the
//! validator can surface them as unknown.

use serde::Deserialize;

use super::types::{AgentId, ParameterCandidate};
use super::vocab;
use super::ExtractError;

const STRUCTURED_CONFIDENCE: f32 = 0.95;

#[derive(Deserialize)]
struct StructuredReading {
    name: String,
    value: f64,
    #[serde(default)]
    unit: Option<String>,
}

/// Either a bare array of readings or an object wrapping one.
#[derive(Deserialize)]
#[serde(untagged)]
enum StructuredDocument {
    Array(Vec<StructuredReading>),
    Wrapped { parameters: Vec<StructuredReading> },
}

fn candidate_from(reading: StructuredReading, raw_text: String) -> ParameterCandidate {
    let name = vocab::canonical_name(&reading.name)
        .map(str::to_string)
        .unwrap_or_else(|| reading.name.trim().to_string());
    ParameterCandidate {
        name,
        value: reading.value,
        unit: reading.unit.filter(|u| !u.trim().is_empty()),
        raw_text,
        source_agent: AgentId::Structured,
        confidence: STRUCTURED_CONFIDENCE,
        status_hint: None,
    }
}

/// Parse a JSON document of readings.
pub fn parse_json(bytes: &[u8]) -> Result<Vec<ParameterCandidate>, ExtractError> {
    let document: StructuredDocument =
        serde_json::from_slice(bytes).map_err(ExtractError::StructuredJson)?;
    let readings = match document {
        StructuredDocument::Array(readings) => readings,
        StructuredDocument::Wrapped { parameters } => parameters,
    };

    Ok(readings
        .into_iter()
        .map(|r| {
            let raw = format!("{} {} {}", r.name, r.value, r.unit.as_deref().unwrap_or(""));
            candidate_from(r, raw.trim_end().to_string())
        })
        .collect())
}

/// Parse a CSV document with `name,value[,unit]` rows. A header row
/// starting with "name" is skipped.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<ParameterCandidate>, ExtractError> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| ExtractError::StructuredCsv(e.to_string()))?;

    let mut candidates = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if index == 0 && fields[0].eq_ignore_ascii_case("name") {
            continue;
        }
        if fields.len() < 2 {
            return Err(ExtractError::StructuredCsv(format!(
                "line {}: expected name,value[,unit]",
                index + 1
            )));
        }
        let value: f64 = fields[1].parse().map_err(|_| {
            ExtractError::StructuredCsv(format!("line {}: invalid value {:?}", index + 1, fields[1]))
        })?;
        let reading = StructuredReading {
            name: fields[0].to_string(),
            value,
            unit: fields.get(2).filter(|u| !u.is_empty()).map(|u| u.to_string()),
        };
        candidates.push(candidate_from(reading, line.to_string()));
    }

    Ok(candidates)
}

/// Dispatch on content shape: JSON when the payload starts with a JSON
/// token, CSV otherwise.
pub fn parse(bytes: &[u8]) -> Result<Vec<ParameterCandidate>, ExtractError> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    match first {
        Some(b'[') | Some(b'{') => parse_json(bytes),
        _ => parse_csv(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_array_of_readings() {
        let input = br#"[{"name": "Hb", "value": 9.5, "unit": "g/dL"},
                         {"name": "MCV", "value": 72.0}]"#;
        let candidates = parse(input).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Hemoglobin");
        assert_eq!(candidates[0].value, 9.5);
        assert_eq!(candidates[0].unit.as_deref(), Some("g/dL"));
        assert_eq!(candidates[0].source_agent, AgentId::Structured);
        assert_eq!(candidates[1].name, "MCV");
        assert!(candidates[1].unit.is_none());
    }

    #[test]
    fn json_wrapped_object() {
        let input = br#"{"parameters": [{"name": "Glucose", "value": 140, "unit": "mg/dL"}]}"#;
        let candidates = parse(input).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Glucose");
    }

    #[test]
    fn unknown_name_kept_raw() {
        let input = br#"[{"name": "Lipoprotein(a)", "value": 25.0}]"#;
        let candidates = parse(input).unwrap();
        assert_eq!(candidates[0].name, "Lipoprotein(a)");
    }

    #[test]
    fn csv_with_header() {
        let input = b"name,value,unit\nHemoglobin,12.5,g/dL\nWBC,9000,/cumm";
        let candidates = parse(input).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].name, "WBC Count");
        assert_eq!(candidates[1].value, 9000.0);
    }

    #[test]
    fn csv_without_unit_column() {
        let input = b"MCV,72";
        let candidates = parse(input).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].unit.is_none());
    }

    #[test]
    fn csv_bad_value_is_an_error() {
        let input = b"Hemoglobin,not-a-number";
        assert!(matches!(parse(input), Err(ExtractError::StructuredCsv(_))));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let input = br#"{"parameters": "#;
        assert!(matches!(parse(input), Err(ExtractError::StructuredJson(_))));
    }
}
