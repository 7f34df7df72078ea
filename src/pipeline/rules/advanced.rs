//! Advanced cardiovascular and metabolic assessment.
//!
//! Three independent calculators: a Framingham-style 10-year coronary
//! risk estimate, a lipid-ratio panel, and ATP-III metabolic-syndrome
//! detection. Every scoring table is ordered data so the point values
//! can be audited against the published ones line by line.

use serde::{Deserialize, Serialize};

use crate::pipeline::context::{DemographicContext, Gender};
use crate::pipeline::report::{ParameterRecord, RiskLevel};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraminghamResult {
    pub total_points: i32,
    /// Estimated 10-year risk, percent.
    pub risk_percent: u32,
    pub category: RiskLevel,
    /// Inputs that fell back to population defaults.
    pub defaulted_inputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LipidRatio {
    pub name: String,
    pub value: f64,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LipidRatioPanel {
    pub ratios: Vec<LipidRatio>,
    pub overall: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetabolicSyndromeResult {
    pub criteria_met: Vec<String>,
    /// How many of the five criteria could be evaluated with the
    /// available data.
    pub criteria_evaluated: usize,
    pub present: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedRiskReport {
    pub framingham: Option<FraminghamResult>,
    pub lipid_ratios: Option<LipidRatioPanel>,
    pub metabolic_syndrome: Option<MetabolicSyndromeResult>,
}

// ---------------------------------------------------------------------------
// Framingham point tables
// ---------------------------------------------------------------------------

/// Population defaults used when a report omits an input.
const DEFAULT_AGE: u32 = 50;
const DEFAULT_GENDER: Gender = Gender::Male;
const DEFAULT_CHOLESTEROL: f64 = 200.0;
const DEFAULT_HDL: f64 = 50.0;

/// Age brackets (inclusive) → points.
const MALE_AGE_POINTS: &[((u32, u32), i32)] = &[
    ((20, 34), -9),
    ((35, 39), -4),
    ((40, 44), 0),
    ((45, 49), 3),
    ((50, 54), 6),
    ((55, 59), 8),
    ((60, 64), 10),
    ((65, 69), 11),
    ((70, 74), 12),
    ((75, 79), 13),
];

const FEMALE_AGE_POINTS: &[((u32, u32), i32)] = &[
    ((20, 34), -7),
    ((35, 39), -3),
    ((40, 44), 0),
    ((45, 49), 3),
    ((50, 54), 6),
    ((55, 59), 8),
    ((60, 64), 10),
    ((65, 69), 12),
    ((70, 74), 14),
    ((75, 79), 16),
];

/// Cholesterol points by coarse age group (rows: 20-39, 40-49, 50-59,
/// 60-69, 70-79) and TC band (columns: <160, <200, <240, <280, 280+).
const MALE_TC_POINTS: &[[i32; 5]; 5] = &[
    [0, 4, 7, 9, 11],
    [0, 3, 5, 6, 8],
    [0, 2, 3, 4, 5],
    [0, 1, 1, 2, 3],
    [0, 0, 0, 1, 1],
];

const FEMALE_TC_POINTS: &[[i32; 5]; 5] = &[
    [0, 4, 8, 11, 13],
    [0, 3, 6, 8, 10],
    [0, 2, 4, 5, 7],
    [0, 1, 2, 3, 4],
    [0, 1, 1, 2, 2],
];

/// Smoking points by the same coarse age groups.
const MALE_SMOKING_POINTS: &[i32; 5] = &[8, 5, 3, 1, 1];
const FEMALE_SMOKING_POINTS: &[i32; 5] = &[9, 7, 4, 2, 1];

/// Total points (inclusive upper bound) → risk percent. Above the last
/// bound the risk saturates at 30%.
const MALE_RISK_PERCENT: &[(i32, u32)] = &[
    (4, 1),
    (5, 2),
    (6, 2),
    (7, 3),
    (8, 4),
    (9, 5),
    (10, 6),
    (11, 8),
    (12, 10),
    (13, 12),
    (14, 16),
    (15, 20),
    (16, 25),
];

const FEMALE_RISK_PERCENT: &[(i32, u32)] = &[
    (12, 1),
    (13, 2),
    (14, 2),
    (15, 3),
    (16, 4),
    (17, 5),
    (18, 6),
    (19, 8),
    (20, 11),
    (21, 14),
    (22, 17),
    (23, 22),
    (24, 27),
];

const RISK_PERCENT_MAX: u32 = 30;

fn find(records: &[ParameterRecord], name: &str) -> Option<f64> {
    records
        .iter()
        .find(|r| r.canonical_name == name)
        .map(|r| r.value)
}

/// Index into the coarse age-group tables; ages are clamped into 20-79.
fn age_group(age: u32) -> usize {
    match age.clamp(20, 79) {
        20..=39 => 0,
        40..=49 => 1,
        50..=59 => 2,
        60..=69 => 3,
        _ => 4,
    }
}

fn tc_band(cholesterol: f64) -> usize {
    if cholesterol < 160.0 {
        0
    } else if cholesterol < 200.0 {
        1
    } else if cholesterol < 240.0 {
        2
    } else if cholesterol < 280.0 {
        3
    } else {
        4
    }
}

fn age_points(age: u32, gender: Gender) -> i32 {
    let table = match gender {
        Gender::Male => MALE_AGE_POINTS,
        Gender::Female => FEMALE_AGE_POINTS,
    };
    let age = age.clamp(20, 79);
    table
        .iter()
        .find(|((lo, hi), _)| age >= *lo && age <= *hi)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}

fn hdl_points(hdl: f64) -> i32 {
    if hdl >= 60.0 {
        -1
    } else if hdl >= 50.0 {
        0
    } else if hdl >= 40.0 {
        1
    } else {
        2
    }
}

fn risk_percent(points: i32, gender: Gender) -> u32 {
    let table = match gender {
        Gender::Male => MALE_RISK_PERCENT,
        Gender::Female => FEMALE_RISK_PERCENT,
    };
    table
        .iter()
        .find(|(bound, _)| points <= *bound)
        .map(|(_, percent)| *percent)
        .unwrap_or(RISK_PERCENT_MAX)
}

fn framingham_category(percent: u32) -> RiskLevel {
    if percent < 10 {
        RiskLevel::Low
    } else if percent < 20 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

/// The Framingham estimate. Runs only when at least one lipid value is
/// present; missing inputs fall back to population defaults and are
/// listed in the result.
fn framingham(
    records: &[ParameterRecord],
    context: &DemographicContext,
) -> Option<FraminghamResult> {
    let cholesterol = find(records, "Cholesterol");
    let hdl = find(records, "HDL");
    if cholesterol.is_none() && hdl.is_none() {
        return None;
    }

    let mut defaulted = Vec::new();
    let age = context.age.unwrap_or_else(|| {
        defaulted.push("age".to_string());
        DEFAULT_AGE
    });
    let gender = context.gender.unwrap_or_else(|| {
        defaulted.push("gender".to_string());
        DEFAULT_GENDER
    });
    let cholesterol = cholesterol.unwrap_or_else(|| {
        defaulted.push("cholesterol".to_string());
        DEFAULT_CHOLESTEROL
    });
    let hdl = hdl.unwrap_or_else(|| {
        defaulted.push("hdl".to_string());
        DEFAULT_HDL
    });

    let group = age_group(age);
    let tc_points = match gender {
        Gender::Male => MALE_TC_POINTS[group][tc_band(cholesterol)],
        Gender::Female => FEMALE_TC_POINTS[group][tc_band(cholesterol)],
    };
    let smoking_points = if context.has_lifestyle("smok") {
        match gender {
            Gender::Male => MALE_SMOKING_POINTS[group],
            Gender::Female => FEMALE_SMOKING_POINTS[group],
        }
    } else {
        0
    };
    let bp_points = if context.has_condition("hypertension") {
        if context.treated_bp {
            2
        } else {
            1
        }
    } else {
        0
    };

    let total = age_points(age, gender) + tc_points + hdl_points(hdl) + smoking_points + bp_points;
    let percent = risk_percent(total, gender);

    Some(FraminghamResult {
        total_points: total,
        risk_percent: percent,
        category: framingham_category(percent),
        defaulted_inputs: defaulted,
    })
}

// ---------------------------------------------------------------------------
// Lipid ratios
// ---------------------------------------------------------------------------

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn ratio_level(value: f64, low_bound: f64, moderate_bound: f64) -> RiskLevel {
    if value < low_bound {
        RiskLevel::Low
    } else if value < moderate_bound {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

/// Derived lipid indices; each is computed only when its inputs exist.
fn lipid_ratios(records: &[ParameterRecord]) -> Option<LipidRatioPanel> {
    let cholesterol = find(records, "Cholesterol");
    let hdl = find(records, "HDL").filter(|v| *v > 0.0);
    let ldl = find(records, "LDL");
    let triglycerides = find(records, "Triglycerides");

    let (Some(tc), Some(hdl)) = (cholesterol, hdl) else {
        return None;
    };

    let mut ratios = vec![
        LipidRatio {
            name: "TC/HDL".into(),
            value: round_to(tc / hdl, 1),
            level: ratio_level(tc / hdl, 4.5, 5.5),
        },
        LipidRatio {
            name: "Non-HDL Cholesterol".into(),
            value: round_to(tc - hdl, 1),
            level: ratio_level(tc - hdl, 130.0, 160.0),
        },
    ];
    if let Some(ldl) = ldl {
        ratios.push(LipidRatio {
            name: "LDL/HDL".into(),
            value: round_to(ldl / hdl, 1),
            level: ratio_level(ldl / hdl, 3.0, 4.0),
        });
    }
    if let Some(tg) = triglycerides {
        ratios.push(LipidRatio {
            name: "TG/HDL".into(),
            value: round_to(tg / hdl, 1),
            level: ratio_level(tg / hdl, 2.0, 4.0),
        });
        if tg > 0.0 {
            let aip = (tg / hdl).log10();
            ratios.push(LipidRatio {
                name: "Atherogenic Index of Plasma".into(),
                value: round_to(aip, 2),
                level: ratio_level(aip, 0.11, 0.21),
            });
        }
    }

    let high = ratios.iter().filter(|r| r.level == RiskLevel::High).count();
    let moderate = ratios
        .iter()
        .filter(|r| r.level == RiskLevel::Moderate)
        .count();
    let overall = if high >= 2 {
        RiskLevel::High
    } else if high >= 1 || moderate >= 2 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    Some(LipidRatioPanel { ratios, overall })
}

// ---------------------------------------------------------------------------
// Metabolic syndrome
// ---------------------------------------------------------------------------

/// ATP-III style criteria: three or more of five.
const METABOLIC_SYNDROME_THRESHOLD: usize = 3;

const WAIST_MALE_CM: f64 = 102.0;
const WAIST_FEMALE_CM: f64 = 88.0;
const TG_CRITERION: f64 = 150.0;
const HDL_MALE_CRITERION: f64 = 40.0;
const HDL_FEMALE_CRITERION: f64 = 50.0;
const GLUCOSE_CRITERION: f64 = 100.0;

fn metabolic_syndrome(
    records: &[ParameterRecord],
    context: &DemographicContext,
) -> Option<MetabolicSyndromeResult> {
    let gender = context.gender.unwrap_or(DEFAULT_GENDER);
    let mut evaluated = 0;
    let mut met = Vec::new();

    if let Some(waist) = context.waist_circumference {
        evaluated += 1;
        let bound = match gender {
            Gender::Male => WAIST_MALE_CM,
            Gender::Female => WAIST_FEMALE_CM,
        };
        if waist >= bound {
            met.push(format!("Waist circumference {waist:.0} cm"));
        }
    }
    if let Some(tg) = find(records, "Triglycerides") {
        evaluated += 1;
        if tg >= TG_CRITERION {
            met.push(format!("Triglycerides {tg:.0} mg/dL"));
        }
    }
    if let Some(hdl) = find(records, "HDL") {
        evaluated += 1;
        let bound = match gender {
            Gender::Male => HDL_MALE_CRITERION,
            Gender::Female => HDL_FEMALE_CRITERION,
        };
        if hdl < bound {
            met.push(format!("HDL {hdl:.0} mg/dL"));
        }
    }
    // History criteria are always evaluable.
    evaluated += 1;
    if context.has_condition("hypertension") {
        met.push("Hypertension".to_string());
    }
    evaluated += 1;
    let glucose_high = find(records, "Glucose").is_some_and(|g| g >= GLUCOSE_CRITERION);
    if glucose_high || context.has_condition("diabetes") {
        met.push("Elevated fasting glucose".to_string());
    }

    if evaluated <= 2 && met.is_empty() {
        return None;
    }

    Some(MetabolicSyndromeResult {
        present: met.len() >= METABOLIC_SYNDROME_THRESHOLD,
        criteria_evaluated: evaluated,
        criteria_met: met,
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run the advanced calculators. `None` when the report carries no
/// lipid or metabolic data at all.
pub fn analyze(
    records: &[ParameterRecord],
    context: &DemographicContext,
) -> Option<AdvancedRiskReport> {
    let has_inputs = ["Cholesterol", "HDL", "LDL", "Triglycerides", "Glucose"]
        .iter()
        .any(|name| find(records, name).is_some())
        || context.waist_circumference.is_some();
    if !has_inputs {
        return None;
    }

    let report = AdvancedRiskReport {
        framingham: framingham(records, context),
        lipid_ratios: lipid_ratios(records),
        metabolic_syndrome: metabolic_syndrome(records, context),
    };
    tracing::info!(
        framingham = report.framingham.is_some(),
        lipid_ratios = report.lipid_ratios.is_some(),
        metabolic_syndrome = report.metabolic_syndrome.is_some(),
        "Advanced assessment complete"
    );
    Some(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::report::ParamStatus;

    fn record(name: &str, value: f64) -> ParameterRecord {
        ParameterRecord {
            canonical_name: name.to_string(),
            value,
            unit: None,
            reference_range: None,
            status: ParamStatus::Unknown,
            supporting_candidates: vec![],
            agent_agreement: 3,
        }
    }

    fn ctx(age: u32, gender: Gender) -> DemographicContext {
        DemographicContext {
            age: Some(age),
            gender: Some(gender),
            ..Default::default()
        }
    }

    #[test]
    fn age_point_tables_cover_all_brackets() {
        assert_eq!(age_points(25, Gender::Male), -9);
        assert_eq!(age_points(47, Gender::Male), 3);
        assert_eq!(age_points(77, Gender::Male), 13);
        assert_eq!(age_points(25, Gender::Female), -7);
        assert_eq!(age_points(77, Gender::Female), 16);
        // Out-of-table ages clamp.
        assert_eq!(age_points(18, Gender::Male), -9);
        assert_eq!(age_points(90, Gender::Female), 16);
    }

    #[test]
    fn hdl_point_bands() {
        assert_eq!(hdl_points(65.0), -1);
        assert_eq!(hdl_points(55.0), 0);
        assert_eq!(hdl_points(45.0), 1);
        assert_eq!(hdl_points(35.0), 2);
    }

    #[test]
    fn framingham_low_risk_male() {
        // 45yo male, TC 180, HDL 55, non-smoker, no hypertension:
        // 3 + 3 + 0 = 6 points -> 2%.
        let records = vec![record("Cholesterol", 180.0), record("HDL", 55.0)];
        let result = framingham(&records, &ctx(45, Gender::Male)).unwrap();
        assert_eq!(result.total_points, 6);
        assert_eq!(result.risk_percent, 2);
        assert_eq!(result.category, RiskLevel::Low);
        assert!(result.defaulted_inputs.is_empty());
    }

    #[test]
    fn framingham_high_risk_smoker() {
        // 62yo male smoker with treated hypertension, TC 250, HDL 35:
        // 10 + 2 + 2 + 1 + 2 = 17 points -> 30%.
        let mut context = ctx(62, Gender::Male);
        context.lifestyle = vec!["smoker".into()];
        context.medical_history = vec!["Hypertension".into()];
        context.treated_bp = true;
        let records = vec![record("Cholesterol", 250.0), record("HDL", 35.0)];
        let result = framingham(&records, &context).unwrap();
        assert_eq!(result.total_points, 17);
        assert_eq!(result.risk_percent, 30);
        assert_eq!(result.category, RiskLevel::High);
    }

    #[test]
    fn framingham_female_tables_differ() {
        let records = vec![record("Cholesterol", 250.0), record("HDL", 45.0)];
        // 62yo female: 10 + 3 + 1 = 14 points -> 2%.
        let result = framingham(&records, &ctx(62, Gender::Female)).unwrap();
        assert_eq!(result.total_points, 14);
        assert_eq!(result.risk_percent, 2);
    }

    #[test]
    fn framingham_defaults_are_reported() {
        let records = vec![record("Cholesterol", 210.0)];
        let result = framingham(&records, &DemographicContext::default()).unwrap();
        assert!(result.defaulted_inputs.contains(&"age".to_string()));
        assert!(result.defaulted_inputs.contains(&"gender".to_string()));
        assert!(result.defaulted_inputs.contains(&"hdl".to_string()));
    }

    #[test]
    fn framingham_skipped_without_lipids() {
        assert!(framingham(&[], &ctx(50, Gender::Male)).is_none());
    }

    #[test]
    fn lipid_ratio_panel() {
        let records = vec![
            record("Cholesterol", 220.0),
            record("HDL", 40.0),
            record("LDL", 140.0),
            record("Triglycerides", 180.0),
        ];
        let panel = lipid_ratios(&records).unwrap();
        let by_name = |name: &str| panel.ratios.iter().find(|r| r.name == name).unwrap();

        assert_eq!(by_name("TC/HDL").value, 5.5);
        assert_eq!(by_name("TC/HDL").level, RiskLevel::High);
        assert_eq!(by_name("Non-HDL Cholesterol").value, 180.0);
        assert_eq!(by_name("Non-HDL Cholesterol").level, RiskLevel::High);
        assert_eq!(by_name("LDL/HDL").value, 3.5);
        assert_eq!(by_name("LDL/HDL").level, RiskLevel::Moderate);
        assert_eq!(by_name("TG/HDL").value, 4.5);
        assert_eq!(by_name("TG/HDL").level, RiskLevel::High);
        assert_eq!(by_name("Atherogenic Index of Plasma").value, 0.65);
        assert_eq!(panel.overall, RiskLevel::High);
    }

    #[test]
    fn healthy_lipids_are_low_overall() {
        let records = vec![
            record("Cholesterol", 170.0),
            record("HDL", 60.0),
            record("Triglycerides", 90.0),
        ];
        let panel = lipid_ratios(&records).unwrap();
        assert_eq!(panel.overall, RiskLevel::Low);
    }

    #[test]
    fn ratios_need_tc_and_hdl() {
        assert!(lipid_ratios(&[record("Cholesterol", 200.0)]).is_none());
        assert!(lipid_ratios(&[record("HDL", 50.0)]).is_none());
    }

    #[test]
    fn metabolic_syndrome_requires_three_criteria() {
        let mut context = ctx(50, Gender::Male);
        context.waist_circumference = Some(110.0);
        context.medical_history = vec!["Hypertension".into()];
        let records = vec![
            record("Triglycerides", 180.0),
            record("HDL", 45.0),
            record("Glucose", 95.0),
        ];
        let result = metabolic_syndrome(&records, &context).unwrap();
        assert_eq!(result.criteria_evaluated, 5);
        assert_eq!(result.criteria_met.len(), 3);
        assert!(result.present);
    }

    #[test]
    fn female_cutoffs_differ() {
        let mut context = ctx(50, Gender::Female);
        context.waist_circumference = Some(95.0);
        // 95 cm is under the male cutoff but over the female one; HDL 45
        // fails the female criterion but passes the male one.
        let records = vec![record("HDL", 45.0)];
        let result = metabolic_syndrome(&records, &context).unwrap();
        assert_eq!(result.criteria_met.len(), 2);
        assert!(!result.present);
    }

    #[test]
    fn diabetes_history_counts_as_glucose_criterion() {
        let mut context = ctx(50, Gender::Male);
        context.medical_history = vec!["Diabetes".into(), "Hypertension".into()];
        context.waist_circumference = Some(110.0);
        let result = metabolic_syndrome(&[], &context).unwrap();
        assert!(result.present);
    }

    #[test]
    fn analyze_is_none_without_any_inputs() {
        assert!(analyze(&[record("Hemoglobin", 13.0)], &DemographicContext::default()).is_none());
    }

    #[test]
    fn analyze_combines_all_three() {
        let mut context = ctx(55, Gender::Male);
        context.waist_circumference = Some(105.0);
        let records = vec![
            record("Cholesterol", 230.0),
            record("HDL", 38.0),
            record("Triglycerides", 200.0),
            record("Glucose", 110.0),
        ];
        let report = analyze(&records, &context).unwrap();
        assert!(report.framingham.is_some());
        assert!(report.lipid_ratios.is_some());
        assert!(report.metabolic_syndrome.unwrap().present);
    }
}
