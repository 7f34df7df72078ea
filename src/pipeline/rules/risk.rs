//! Stage 3: composite risk scores.
//!
//! Component risks (anemia, infection, bleeding) come from per-parameter
//! step tables; the overall score is a weighted health score on a 0-100
//! scale where higher means healthier. All step tables are ordered data.

use crate::pipeline::report::{ParameterRecord, RiskKind, RiskLevel, RiskScore};

/// Score when no step matches (healthy baseline).
const BASELINE_RISK: f64 = 10.0;

/// Hemoglobin (g/dL): first step whose bound exceeds the value wins.
const ANEMIA_STEPS: &[(f64, f64)] = &[(7.0, 100.0), (10.0, 70.0), (12.0, 40.0)];

/// WBC (/cumm), low side then high side.
const INFECTION_LOW_STEPS: &[(f64, f64)] = &[(2000.0, 90.0), (4000.0, 60.0)];
const INFECTION_HIGH_STEPS: &[(f64, f64)] = &[(15000.0, 50.0), (11000.0, 30.0)];

/// Platelets (/cumm).
const BLEEDING_STEPS: &[(f64, f64)] = &[
    (20_000.0, 100.0),
    (50_000.0, 80.0),
    (100_000.0, 50.0),
    (150_000.0, 30.0),
];

/// Weights for the overall score. Bleeding dominates because platelet
/// collapse is the most acutely dangerous of the three.
const WEIGHT_ANEMIA: f64 = 0.3;
const WEIGHT_INFECTION: f64 = 0.3;
const WEIGHT_BLEEDING: f64 = 0.4;

/// Weighted-risk thresholds for the overall level.
const LEVEL_HIGH: f64 = 60.0;
const LEVEL_MODERATE: f64 = 30.0;

fn step_below(steps: &[(f64, f64)], value: f64) -> Option<f64> {
    steps
        .iter()
        .find(|(bound, _)| value < *bound)
        .map(|(_, score)| *score)
}

fn step_above(steps: &[(f64, f64)], value: f64) -> Option<f64> {
    steps
        .iter()
        .find(|(bound, _)| value > *bound)
        .map(|(_, score)| *score)
}

pub fn level_for(risk: f64) -> RiskLevel {
    if risk > LEVEL_HIGH {
        RiskLevel::High
    } else if risk > LEVEL_MODERATE {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

fn find(records: &[ParameterRecord], name: &str) -> Option<f64> {
    records
        .iter()
        .find(|r| r.canonical_name == name)
        .map(|r| r.value)
}

fn anemia_risk(records: &[ParameterRecord]) -> (f64, Vec<String>) {
    match find(records, "Hemoglobin") {
        Some(hb) => {
            let risk = step_below(ANEMIA_STEPS, hb).unwrap_or(BASELINE_RISK);
            let factors = if risk > BASELINE_RISK {
                vec![format!("Hemoglobin {hb:.1} g/dL")]
            } else {
                vec![]
            };
            (risk, factors)
        }
        None => (BASELINE_RISK, vec![]),
    }
}

fn infection_risk(records: &[ParameterRecord]) -> (f64, Vec<String>) {
    match find(records, "WBC Count") {
        Some(wbc) => {
            let risk = step_below(INFECTION_LOW_STEPS, wbc)
                .or_else(|| step_above(INFECTION_HIGH_STEPS, wbc))
                .unwrap_or(BASELINE_RISK);
            let factors = if risk > BASELINE_RISK {
                vec![format!("WBC count {wbc:.0} /cumm")]
            } else {
                vec![]
            };
            (risk, factors)
        }
        None => (BASELINE_RISK, vec![]),
    }
}

fn bleeding_risk(records: &[ParameterRecord]) -> (f64, Vec<String>) {
    match find(records, "Platelet Count") {
        Some(platelets) => {
            let risk = step_below(BLEEDING_STEPS, platelets).unwrap_or(BASELINE_RISK);
            let factors = if risk > BASELINE_RISK {
                vec![format!("Platelet count {platelets:.0} /cumm")]
            } else {
                vec![]
            };
            (risk, factors)
        }
        None => (BASELINE_RISK, vec![]),
    }
}

/// Compute the component risks and the weighted overall score. Missing
/// parameters contribute the healthy baseline.
pub fn assess(records: &[ParameterRecord]) -> Vec<RiskScore> {
    let (anemia, anemia_factors) = anemia_risk(records);
    let (infection, infection_factors) = infection_risk(records);
    let (bleeding, bleeding_factors) = bleeding_risk(records);

    let weighted =
        anemia * WEIGHT_ANEMIA + infection * WEIGHT_INFECTION + bleeding * WEIGHT_BLEEDING;
    let health = (100.0 - weighted).clamp(0.0, 100.0);

    let mut overall_factors = Vec::new();
    overall_factors.extend(anemia_factors.iter().cloned());
    overall_factors.extend(infection_factors.iter().cloned());
    overall_factors.extend(bleeding_factors.iter().cloned());

    tracing::info!(
        anemia,
        infection,
        bleeding,
        health,
        "Composite risk assessment complete"
    );

    vec![
        RiskScore {
            kind: RiskKind::Anemia,
            value: anemia,
            level: level_for(anemia),
            contributing_factors: anemia_factors,
        },
        RiskScore {
            kind: RiskKind::Infection,
            value: infection,
            level: level_for(infection),
            contributing_factors: infection_factors,
        },
        RiskScore {
            kind: RiskKind::Bleeding,
            value: bleeding,
            level: level_for(bleeding),
            contributing_factors: bleeding_factors,
        },
        RiskScore {
            kind: RiskKind::Overall,
            // Health score: higher is better, unlike the component risks.
            value: health,
            level: level_for(weighted),
            contributing_factors: overall_factors,
        },
    ]
}
