//! Unit normalization and conversion.
//!
//! Reports print the same unit in many spellings; `normalize` maps them
//! to one canonical form. Conversions are looked up parameter-specific
//! first (glucose mg/dL→mmol/L differs from cholesterol's) and fall back
//! to generic pairs that hold for any analyte.

/// Spelling variants → canonical unit. Lowercase keys, sorted for
/// binary search.
const SPELLINGS: &[(&str, &str)] = &[
    ("%", "%"),
    ("/cumm", "/cumm"),
    ("/ul", "/uL"),
    ("10^12/l", "10^12/L"),
    ("10^9/l", "10^9/L"),
    ("cells/cumm", "/cumm"),
    ("fl", "fL"),
    ("g/dl", "g/dL"),
    ("g/l", "g/L"),
    ("lakh/cumm", "lakhs/cumm"),
    ("lakhs/cumm", "lakhs/cumm"),
    ("mcg/dl", "mcg/dL"),
    ("meq/l", "mEq/L"),
    ("mg/dl", "mg/dL"),
    ("mg/l", "mg/L"),
    ("mill/cumm", "mill/cumm"),
    ("million/cumm", "mill/cumm"),
    ("miu/l", "mIU/L"),
    ("mm/hr", "mm/hr"),
    ("mmol/l", "mmol/L"),
    ("ng/ml", "ng/mL"),
    ("pg", "pg"),
    ("pg/ml", "pg/mL"),
    ("thou/cumm", "thou/cumm"),
    ("thousand/cumm", "thou/cumm"),
    ("u/l", "U/L"),
    ("um3", "fL"),
    ("umol/l", "umol/L"),
];

/// Parameter-specific factors: (parameter, from, to, factor).
const PARAMETER_FACTORS: &[(&str, &str, &str, f64)] = &[
    ("Glucose", "mg/dL", "mmol/L", 0.0555),
    ("Glucose", "mmol/L", "mg/dL", 18.018),
    ("Cholesterol", "mmol/L", "mg/dL", 38.67),
    ("Cholesterol", "mg/dL", "mmol/L", 0.02586),
    ("HDL", "mmol/L", "mg/dL", 38.67),
    ("HDL", "mg/dL", "mmol/L", 0.02586),
    ("LDL", "mmol/L", "mg/dL", 38.67),
    ("LDL", "mg/dL", "mmol/L", 0.02586),
    ("Triglycerides", "mmol/L", "mg/dL", 88.57),
    ("Triglycerides", "mg/dL", "mmol/L", 0.01129),
    ("Creatinine", "mg/dL", "umol/L", 88.4),
    ("Creatinine", "umol/L", "mg/dL", 0.0113),
];

/// Generic factors valid for any parameter: (from, to, factor).
const GENERIC_FACTORS: &[(&str, &str, f64)] = &[
    ("/cumm", "10^9/L", 0.001),
    ("10^9/L", "/cumm", 1000.0),
    ("/uL", "/cumm", 1.0),
    ("/cumm", "/uL", 1.0),
    ("thou/cumm", "/cumm", 1000.0),
    ("/cumm", "thou/cumm", 0.001),
    ("lakhs/cumm", "/cumm", 100_000.0),
    ("mill/cumm", "10^12/L", 1.0),
    ("10^12/L", "mill/cumm", 1.0),
    ("g/dL", "g/L", 10.0),
    ("g/L", "g/dL", 0.1),
    ("mEq/L", "mmol/L", 1.0),
    ("mmol/L", "mEq/L", 1.0),
];

/// Canonical spelling of a raw unit token, if recognized.
pub fn normalize(raw: &str) -> Option<&'static str> {
    let key = raw.trim().to_lowercase();
    SPELLINGS
        .binary_search_by(|(spelling, _)| spelling.cmp(&key.as_str()))
        .ok()
        .map(|i| SPELLINGS[i].1)
}

/// Multiplicative factor converting `from` into `to` for `parameter`.
/// Both units must already be canonical. Identity when equal.
pub fn conversion_factor(parameter: &str, from: &str, to: &str) -> Option<f64> {
    if from == to {
        return Some(1.0);
    }
    PARAMETER_FACTORS
        .iter()
        .find(|(p, f, t, _)| *p == parameter && *f == from && *t == to)
        .map(|(_, _, _, factor)| *factor)
        .or_else(|| {
            GENERIC_FACTORS
                .iter()
                .find(|(f, t, _)| *f == from && *t == to)
                .map(|(_, _, factor)| *factor)
        })
}

/// Convert a raw (value, unit) pair into the target unit. Returns the
/// converted value, or `None` when the unit is unknown or no factor
/// exists for the pair.
pub fn convert(parameter: &str, value: f64, raw_unit: &str, target_unit: &str) -> Option<f64> {
    let from = normalize(raw_unit)?;
    let factor = conversion_factor(parameter, from, target_unit)?;
    Some(value * factor)
}
