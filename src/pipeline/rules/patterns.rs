//! Stage 2: correlated-pattern detection.
//!
//! Each rule reads several validated records together and emits a
//! finding when its combination holds. Rules fire independently; a
//! report can legitimately carry both a bacterial and a viral infection
//! finding when the differential is ambiguous.

use crate::pipeline::report::{
    Likelihood, Limitation, ParamStatus, ParameterRecord, PatternFinding, Severity,
};

use super::severity::severity_for;

/// MCV below this is microcytic, above `MCV_MACROCYTIC` macrocytic.
const MCV_MICROCYTIC: f64 = 80.0;
const MCV_MACROCYTIC: f64 = 100.0;

/// Hemoglobin below this raises anemia likelihood to high.
const HB_HIGH_LIKELIHOOD: f64 = 10.0;

/// Differential thresholds for infection typing (percent).
const NEUTROPHIL_BACTERIAL: f64 = 70.0;
const LYMPHOCYTE_VIRAL: f64 = 40.0;

/// Platelet severity steps for bleeding risk (/cumm).
const PLATELET_SEVERE: f64 = 50_000.0;
const PLATELET_MODERATE: f64 = 100_000.0;

fn find<'a>(records: &'a [ParameterRecord], name: &str) -> Option<&'a ParameterRecord> {
    records.iter().find(|r| r.canonical_name == name)
}

fn is_low(records: &[ParameterRecord], name: &str) -> bool {
    find(records, name).is_some_and(|r| r.status == ParamStatus::Low)
}

fn is_high(records: &[ParameterRecord], name: &str) -> bool {
    find(records, name).is_some_and(|r| r.status == ParamStatus::High)
}

/// Run every pattern rule. Returns the findings plus limitations for
/// rules that had to be skipped for missing inputs.
pub fn detect(records: &[ParameterRecord]) -> (Vec<PatternFinding>, Vec<Limitation>) {
    let mut findings = Vec::new();
    let mut limitations = Vec::new();

    anemia(records, &mut findings, &mut limitations);
    bacterial_infection(records, &mut findings);
    viral_infection(records, &mut findings);
    leukopenia(records, &mut findings);
    bleeding_risk(records, &mut findings);
    pancytopenia(records, &mut findings);

    tracing::info!(findings = findings.len(), "Pattern detection complete");
    (findings, limitations)
}

/// Anemia typing requires MCV; without it the rule is skipped rather
/// than guessed.
fn anemia(
    records: &[ParameterRecord],
    findings: &mut Vec<PatternFinding>,
    limitations: &mut Vec<Limitation>,
) {
    let Some(hb) = find(records, "Hemoglobin") else {
        return;
    };
    if hb.status != ParamStatus::Low {
        return;
    }
    let Some(mcv) = find(records, "MCV") else {
        limitations.push(Limitation::new(
            "patterns",
            "Hemoglobin is low but MCV is unavailable; anemia cannot be classified",
        ));
        return;
    };

    let classification = if mcv.value < MCV_MICROCYTIC {
        "Microcytic Anemia"
    } else if mcv.value > MCV_MACROCYTIC {
        "Macrocytic Anemia"
    } else {
        "Normocytic Anemia"
    };
    let likelihood = if hb.value < HB_HIGH_LIKELIHOOD {
        Likelihood::High
    } else {
        Likelihood::Moderate
    };

    findings.push(PatternFinding {
        pattern_id: "anemia".into(),
        involved_parameters: vec!["Hemoglobin".into(), "MCV".into()],
        classification: classification.into(),
        severity: severity_for(hb).unwrap_or(Severity::Mild),
        likelihood,
    });
}

fn bacterial_infection(records: &[ParameterRecord], findings: &mut Vec<PatternFinding>) {
    let neutrophils = find(records, "Neutrophils");
    if is_high(records, "WBC Count")
        && neutrophils.is_some_and(|n| n.value > NEUTROPHIL_BACTERIAL)
    {
        let wbc = find(records, "WBC Count").and_then(severity_for);
        findings.push(PatternFinding {
            pattern_id: "bacterial_infection".into(),
            involved_parameters: vec!["WBC Count".into(), "Neutrophils".into()],
            classification: "Possible Bacterial Infection".into(),
            severity: wbc.unwrap_or(Severity::Mild),
            likelihood: Likelihood::Moderate,
        });
    }
}

fn viral_infection(records: &[ParameterRecord], findings: &mut Vec<PatternFinding>) {
    let lymphocytes = find(records, "Lymphocytes");
    if is_high(records, "WBC Count") && lymphocytes.is_some_and(|l| l.value > LYMPHOCYTE_VIRAL) {
        let wbc = find(records, "WBC Count").and_then(severity_for);
        findings.push(PatternFinding {
            pattern_id: "viral_infection".into(),
            involved_parameters: vec!["WBC Count".into(), "Lymphocytes".into()],
            classification: "Possible Viral Infection".into(),
            severity: wbc.unwrap_or(Severity::Mild),
            likelihood: Likelihood::Moderate,
        });
    }
}

fn leukopenia(records: &[ParameterRecord], findings: &mut Vec<PatternFinding>) {
    if let Some(wbc) = find(records, "WBC Count") {
        if wbc.status == ParamStatus::Low {
            findings.push(PatternFinding {
                pattern_id: "leukopenia".into(),
                involved_parameters: vec!["WBC Count".into()],
                classification: "Leukopenia / Possible Immune Suppression".into(),
                severity: severity_for(wbc).unwrap_or(Severity::Mild),
                likelihood: Likelihood::Moderate,
            });
        }
    }
}

fn bleeding_risk(records: &[ParameterRecord], findings: &mut Vec<PatternFinding>) {
    let Some(platelets) = find(records, "Platelet Count") else {
        return;
    };
    if platelets.status != ParamStatus::Low {
        return;
    }
    let severity = if platelets.value < PLATELET_SEVERE {
        Severity::Severe
    } else if platelets.value < PLATELET_MODERATE {
        Severity::Moderate
    } else {
        Severity::Mild
    };
    findings.push(PatternFinding {
        pattern_id: "bleeding_risk".into(),
        involved_parameters: vec!["Platelet Count".into()],
        classification: "Thrombocytopenia / Bleeding Risk".into(),
        severity,
        likelihood: if severity == Severity::Severe {
            Likelihood::High
        } else {
            Likelihood::Moderate
        },
    });
}

/// Fires in addition to the individual cytopenia findings.
fn pancytopenia(records: &[ParameterRecord], findings: &mut Vec<PatternFinding>) {
    if is_low(records, "Hemoglobin")
        && is_low(records, "WBC Count")
        && is_low(records, "Platelet Count")
    {
        findings.push(PatternFinding {
            pattern_id: "pancytopenia".into(),
            involved_parameters: vec![
                "Hemoglobin".into(),
                "WBC Count".into(),
                "Platelet Count".into(),
            ],
            classification: "Pancytopenia".into(),
            severity: Severity::Severe,
            likelihood: Likelihood::High,
        });
    }
}
