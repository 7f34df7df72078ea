//! Banded reference-range table.
//!
//! The table ships embedded in the binary and can be overridden from a
//! JSON file at runtime. Each parameter has a default range plus optional
//! demographic bands. Band selection precedence, most specific first:
//! gender + age band, gender-only band, genderless age band, parameter
//! default.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::pipeline::context::Gender;
use crate::pipeline::report::ResolvedRange;

use super::ValidateError;

/// The table compiled into the binary.
const EMBEDDED_TABLE: &str = include_str!("reference_ranges.json");

#[derive(Debug, Clone, Copy, Deserialize)]
struct RangeBounds {
    min: f64,
    max: f64,
}

/// One demographic band. Missing age bounds are open-ended; a band with
/// neither age bound acts as a gender default.
#[derive(Debug, Clone, Deserialize)]
struct Band {
    gender: Option<Gender>,
    min_age: Option<u32>,
    max_age: Option<u32>,
    min: f64,
    max: f64,
}

impl Band {
    fn has_age_bounds(&self) -> bool {
        self.min_age.is_some() || self.max_age.is_some()
    }

    fn matches_age(&self, age: u32) -> bool {
        self.min_age.map_or(true, |lo| age >= lo) && self.max_age.map_or(true, |hi| age <= hi)
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(g) = self.gender {
            parts.push(match g {
                Gender::Male => "male".to_string(),
                Gender::Female => "female".to_string(),
            });
        }
        match (self.min_age, self.max_age) {
            (Some(lo), Some(hi)) => parts.push(format!("age {lo}-{hi}")),
            (Some(lo), None) => parts.push(format!("age {lo}+")),
            (None, Some(hi)) => parts.push(format!("age 0-{hi}")),
            (None, None) => {}
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ParameterRanges {
    unit: String,
    default: RangeBounds,
    #[serde(default)]
    bands: Vec<Band>,
}

/// All known reference ranges, keyed by canonical parameter name.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ReferenceTable {
    parameters: HashMap<String, ParameterRanges>,
}

impl ReferenceTable {
    /// The table compiled into the binary.
    pub fn embedded() -> Result<Self, ValidateError> {
        serde_json::from_str(EMBEDDED_TABLE).map_err(ValidateError::Table)
    }

    /// Load a replacement table from disk.
    pub fn from_file(path: &Path) -> Result<Self, ValidateError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(ValidateError::Table)
    }

    pub fn contains(&self, parameter: &str) -> bool {
        self.parameters.contains_key(parameter)
    }

    /// The unit the table expresses this parameter in.
    pub fn table_unit(&self, parameter: &str) -> Option<&str> {
        self.parameters.get(parameter).map(|p| p.unit.as_str())
    }

    /// Resolve the effective range for a parameter given whatever
    /// demographics are known.
    pub fn resolve(
        &self,
        parameter: &str,
        age: Option<u32>,
        gender: Option<Gender>,
    ) -> Option<ResolvedRange> {
        let entry = self.parameters.get(parameter)?;

        let band = self.select_band(entry, age, gender);
        let resolved = match band {
            Some(band) => ResolvedRange {
                min: band.min,
                max: band.max,
                unit: entry.unit.clone(),
                adjusted_for: Some(band.describe()),
            },
            None => ResolvedRange {
                min: entry.default.min,
                max: entry.default.max,
                unit: entry.unit.clone(),
                adjusted_for: None,
            },
        };
        Some(resolved)
    }

    fn select_band<'a>(
        &self,
        entry: &'a ParameterRanges,
        age: Option<u32>,
        gender: Option<Gender>,
    ) -> Option<&'a Band> {
        // Gender + age band.
        if let (Some(age), Some(gender)) = (age, gender) {
            if let Some(band) = entry.bands.iter().find(|b| {
                b.gender == Some(gender) && b.has_age_bounds() && b.matches_age(age)
            }) {
                return Some(band);
            }
        }
        // Gender default (no age bounds).
        if let Some(gender) = gender {
            if let Some(band) = entry
                .bands
                .iter()
                .find(|b| b.gender == Some(gender) && !b.has_age_bounds())
            {
                return Some(band);
            }
        }
        // Genderless age band.
        if let Some(age) = age {
            if let Some(band) = entry
                .bands
                .iter()
                .find(|b| b.gender.is_none() && b.has_age_bounds() && b.matches_age(age))
            {
                return Some(band);
            }
        }
        None
    }
}
