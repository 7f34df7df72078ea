//! Stage 1: deviation severity.
//!
//! Severity is a function of how far a value sits outside its range,
//! expressed as a percentage of the violated bound. The bands are data,
//! not branches, so adjusting them never touches control flow.

use crate::pipeline::report::{ParamStatus, ParameterRecord, Severity};

/// Upper deviation bound (exclusive, percent) → severity. Anything past
/// the last band is severe.
const SEVERITY_BANDS: &[(f64, Severity)] = &[(10.0, Severity::Mild), (25.0, Severity::Moderate)];

/// Percentage deviation from the violated bound. Zero for in-range,
/// unknown, or unbounded (min = 0) records.
pub fn deviation_percent(record: &ParameterRecord) -> f64 {
    let Some(range) = &record.reference_range else {
        return 0.0;
    };
    match record.status {
        ParamStatus::Low if range.min > 0.0 => (range.min - record.value) / range.min * 100.0,
        ParamStatus::High if range.max > 0.0 => (record.value - range.max) / range.max * 100.0,
        _ => 0.0,
    }
}

/// Severity band for an abnormal record; `None` when the record is not
/// abnormal or carries no range.
pub fn severity_for(record: &ParameterRecord) -> Option<Severity> {
    if !record.is_abnormal() || record.reference_range.is_none() {
        return None;
    }
    let deviation = deviation_percent(record);
    let band = SEVERITY_BANDS
        .iter()
        .find(|(bound, _)| deviation < *bound)
        .map(|(_, severity)| *severity)
        .unwrap_or(Severity::Severe);
    Some(band)
}
