//! Shared clinical vocabulary: alias dictionary, unit tokens, value and
//! range extraction, and noise-line filters used by all three agents.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::context::Gender;

/// Alias → canonical parameter name. Lowercase, sorted by alias for
/// binary search.
const ALIASES: &[(&str, &str)] = &[
    ("25-oh vitamin d", "Vitamin D"),
    ("basophils", "Basophils"),
    ("blood sugar", "Glucose"),
    ("blood urea", "Urea"),
    ("blood urea nitrogen", "Urea"),
    ("bun", "Urea"),
    ("cholesterol", "Cholesterol"),
    ("creatinine", "Creatinine"),
    ("eosinophils", "Eosinophils"),
    ("esr", "ESR"),
    ("fasting glucose", "Glucose"),
    ("fbs", "Glucose"),
    ("ferritin", "Ferritin"),
    ("glucose", "Glucose"),
    ("glucose fasting", "Glucose"),
    ("haematocrit", "PCV"),
    ("haemoglobin", "Hemoglobin"),
    ("hb", "Hemoglobin"),
    ("hct", "PCV"),
    ("hdl", "HDL"),
    ("hdl cholesterol", "HDL"),
    ("hematocrit", "PCV"),
    ("hemoglobin", "Hemoglobin"),
    ("hgb", "Hemoglobin"),
    ("iron", "Iron"),
    ("ldl", "LDL"),
    ("ldl cholesterol", "LDL"),
    ("leukocyte count", "WBC Count"),
    ("lymphocyte", "Lymphocytes"),
    ("lymphocytes", "Lymphocytes"),
    ("mch", "MCH"),
    ("mchc", "MCHC"),
    ("mcv", "MCV"),
    ("mean corpuscular volume", "MCV"),
    ("monocytes", "Monocytes"),
    ("neutrophil", "Neutrophils"),
    ("neutrophils", "Neutrophils"),
    ("packed cell volume", "PCV"),
    ("pcv", "PCV"),
    ("platelet", "Platelet Count"),
    ("platelet count", "Platelet Count"),
    ("platelets", "Platelet Count"),
    ("plt", "Platelet Count"),
    ("polymorphs", "Neutrophils"),
    ("rbc", "RBC Count"),
    ("rbc count", "RBC Count"),
    ("rdw", "RDW"),
    ("rdw-cv", "RDW"),
    ("red blood cell count", "RBC Count"),
    ("serum creatinine", "Creatinine"),
    ("serum iron", "Iron"),
    ("tg", "Triglycerides"),
    ("tlc", "WBC Count"),
    ("total cholesterol", "Cholesterol"),
    ("total leucocyte count", "WBC Count"),
    ("total rbc count", "RBC Count"),
    ("total wbc count", "WBC Count"),
    ("triglyceride", "Triglycerides"),
    ("triglycerides", "Triglycerides"),
    ("tsh", "TSH"),
    ("uric acid", "Uric Acid"),
    ("vit b12", "Vitamin B12"),
    ("vitamin b12", "Vitamin B12"),
    ("vitamin d", "Vitamin D"),
    ("wbc", "WBC Count"),
    ("wbc count", "WBC Count"),
    ("white blood cell count", "WBC Count"),
];

/// Unit tokens as they appear in reports, longest-match first.
static UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)\b(
            g/dl | g/l | mg/dl | mg/l | mcg/dl |
            mmol/l | umol/l | meq/l | miu/l |
            ng/ml | pg/ml |
            mill(?:ion)?/cumm | thou(?:sand)?/cumm | lakhs?/cumm | cells/cumm |
            10\^9/l | 10\^12/l |
            mm/hr | u/l |
            fl | pg
        )\b | /cumm | /ul | %",
    )
    .unwrap()
});

/// A decimal value; preferred over bare integers in the same window.
static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+").unwrap());

/// An integer value, allowing thousands separators ("2,50,000").
static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:,\d{2,3})+|\d+").unwrap());

/// A printed reference range, e.g. "12.0 - 16.0" or "4000 to 11000".
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?(?:,\d{2,3})*)\s*(?:-|–|to)\s*(\d+(?:\.\d+)?(?:,\d{2,3})*)").unwrap()
});

static AGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bage\b\s*[:/]?\s*(\d{1,3})").unwrap());

static GENDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:sex|gender)\b\s*[:/]?\s*(male|female|m|f)\b").unwrap());

/// Lines that carry no parameter data: letterheads, pagination, sign-offs.
static NOISE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^\s*page\s+\d+",
        r"(?i)end\s+of\s+report",
        r"(?i)^\s*(?:dr\.|pathologist|technician|verified\s+by)",
        r"(?i)\b(?:phone|tel|fax|email)\b\s*[:.]",
        r"(?i)^\s*(?:www\.|http)",
        r"(?i)laboratory\s+report\s*$",
        r"(?i)^\s*-{3,}\s*$|^\s*={3,}\s*$|^\s*\*{3,}\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Normalize a raw label and resolve it to a canonical parameter name.
pub fn canonical_name(raw: &str) -> Option<&'static str> {
    let cleaned = raw
        .trim()
        .trim_end_matches([':', '#', '.', '-'])
        .trim()
        .to_lowercase();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    ALIASES
        .binary_search_by(|(alias, _)| alias.cmp(&collapsed.as_str()))
        .ok()
        .map(|i| ALIASES[i].1)
}

/// Find the longest known alias at the start of a line.
/// Returns the canonical name and the matched prefix length.
pub fn leading_parameter(line: &str) -> Option<(&'static str, usize)> {
    let lower = line.to_lowercase();
    let mut best: Option<(&'static str, usize)> = None;
    for (alias, canonical) in ALIASES {
        if lower.starts_with(alias) {
            // Word boundary: the alias must not continue into a letter.
            let boundary_ok = lower[alias.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphabetic());
            if boundary_ok && best.map_or(true, |(_, len)| alias.len() > len) {
                best = Some((canonical, alias.len()));
            }
        }
    }
    best
}

/// First recognized unit token in a text window.
pub fn find_unit(text: &str) -> Option<String> {
    UNIT_RE.find(text).map(|m| m.as_str().to_string())
}

/// First numeric value in a window, preferring a decimal over an integer.
pub fn extract_value(text: &str) -> Option<f64> {
    if let Some(m) = DECIMAL_RE.find(text) {
        return m.as_str().parse().ok();
    }
    INTEGER_RE
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// A printed min–max range in a window, if any.
pub fn extract_range(text: &str) -> Option<(f64, f64)> {
    let caps = RANGE_RE.captures(text)?;
    let min: f64 = caps[1].replace(',', "").parse().ok()?;
    let max: f64 = caps[2].replace(',', "").parse().ok()?;
    if min <= max {
        Some((min, max))
    } else {
        None
    }
}

pub fn is_noise_line(line: &str) -> bool {
    NOISE_RES.iter().any(|re| re.is_match(line))
}

pub fn extract_age(text: &str) -> Option<u32> {
    AGE_RE
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .filter(|a| *a <= 120)
}

pub fn extract_gender(text: &str) -> Option<Gender> {
    GENDER_RE.captures(text).and_then(|c| Gender::parse(&c[1]))
}
