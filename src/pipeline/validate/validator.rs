//! Demographic-aware validation.
//!
//! Classifies each merged record against the effective reference range
//! for the patient's age and gender, converting units into the table's
//! canonical unit first. Validation never aborts: records the table
//! cannot place are marked `UNKNOWN` and a limitation is recorded.

use crate::pipeline::context::DemographicContext;
use crate::pipeline::report::{Limitation, ParamStatus, ParameterRecord, ResolvedRange};

use super::ranges::ReferenceTable;
use super::units;

pub struct Validator {
    table: ReferenceTable,
}

fn classify(value: f64, range: &ResolvedRange) -> ParamStatus {
    if value < range.min {
        ParamStatus::Low
    } else if value > range.max {
        ParamStatus::High
    } else {
        ParamStatus::Normal
    }
}

impl Validator {
    pub fn new(table: ReferenceTable) -> Self {
        Self { table }
    }

    /// Classify every record in place; returns the limitations hit.
    ///
    /// On success the record's value and unit are normalized to the
    /// table's canonical unit, so downstream rules can rely on one unit
    /// per parameter.
    pub fn validate(
        &self,
        records: &mut [ParameterRecord],
        context: &DemographicContext,
    ) -> Vec<Limitation> {
        let mut limitations = Vec::new();

        for record in records.iter_mut() {
            let Some(range) =
                self.table
                    .resolve(&record.canonical_name, context.age, context.gender)
            else {
                record.status = ParamStatus::Unknown;
                limitations.push(Limitation::new(
                    "validation",
                    format!("No reference range for {}", record.canonical_name),
                ));
                continue;
            };

            let value = match &record.unit {
                Some(unit) => {
                    match units::convert(&record.canonical_name, record.value, unit, &range.unit) {
                        Some(converted) => converted,
                        None => {
                            record.status = ParamStatus::Unknown;
                            limitations.push(Limitation::new(
                                "validation",
                                format!(
                                    "Cannot convert {} from {} to {}",
                                    record.canonical_name, unit, range.unit
                                ),
                            ));
                            continue;
                        }
                    }
                }
                // No unit captured: assume the table's canonical unit.
                None => record.value,
            };

            let status = classify(value, &range);
            self.cross_check_hints(record, status);

            record.value = value;
            record.unit = Some(range.unit.clone());
            record.status = status;
            record.reference_range = Some(range);
        }

        limitations
    }

    /// A status hint comes from a range printed in the document itself.
    /// The static table always wins, but a disagreement is worth a log
    /// line since it usually means a lab uses nonstandard ranges.
    fn cross_check_hints(&self, record: &ParameterRecord, status: ParamStatus) {
        for candidate in &record.supporting_candidates {
            if let Some(hint) = candidate.status_hint {
                if hint != status {
                    tracing::warn!(
                        parameter = %record.canonical_name,
                        computed = ?status,
                        printed = ?hint,
                        "Document's printed range disagrees with reference table"
                    );
                }
            }
        }
    }
}
