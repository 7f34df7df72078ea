//! Stage 4: contextual risk modifiers.
//!
//! Patient history and lifestyle scale the component risks. Every
//! modifier is one row in a declarative table: a matcher over the
//! context, a multiplier, and the risk kinds it applies to. The stage
//! also introduces the cardiovascular and metabolic scores, which exist
//! only when context can be applied to a lipid or glucose reading.

use crate::pipeline::context::DemographicContext;
use crate::pipeline::report::{ParameterRecord, RiskKind, RiskScore};

use super::risk::level_for;

/// A single contextual adjustment rule.
pub struct ModifierRule {
    pub label: &'static str,
    pub multiplier: f64,
    pub applies_to: &'static [RiskKind],
    applies: fn(&DemographicContext) -> bool,
}

const ALL_COMPONENTS: &[RiskKind] = &[
    RiskKind::Anemia,
    RiskKind::Infection,
    RiskKind::Bleeding,
    RiskKind::Cardiovascular,
    RiskKind::Metabolic,
];
const CARDIO_METABOLIC: &[RiskKind] = &[RiskKind::Cardiovascular, RiskKind::Metabolic];

/// The modifier table. Multipliers above 1 amplify risk; "active" is the
/// one protective entry.
const MODIFIERS: &[ModifierRule] = &[
    ModifierRule {
        label: "age 40-59",
        multiplier: 1.2,
        applies_to: ALL_COMPONENTS,
        applies: |ctx| matches!(ctx.age, Some(a) if (40..=59).contains(&a)),
    },
    ModifierRule {
        label: "age 60+",
        multiplier: 1.4,
        applies_to: ALL_COMPONENTS,
        applies: |ctx| matches!(ctx.age, Some(a) if a >= 60),
    },
    ModifierRule {
        label: "diabetes",
        multiplier: 1.3,
        applies_to: CARDIO_METABOLIC,
        applies: |ctx| ctx.has_condition("diabetes"),
    },
    ModifierRule {
        label: "hypertension",
        multiplier: 1.2,
        applies_to: &[RiskKind::Cardiovascular],
        applies: |ctx| ctx.has_condition("hypertension"),
    },
    ModifierRule {
        label: "heart disease",
        multiplier: 1.4,
        applies_to: &[RiskKind::Cardiovascular],
        applies: |ctx| ctx.has_condition("heart disease"),
    },
    ModifierRule {
        label: "kidney disease",
        multiplier: 1.3,
        applies_to: &[RiskKind::Anemia, RiskKind::Cardiovascular],
        applies: |ctx| ctx.has_condition("kidney disease"),
    },
    ModifierRule {
        label: "smoker",
        multiplier: 1.3,
        applies_to: &[RiskKind::Cardiovascular],
        applies: |ctx| ctx.has_lifestyle("smoker") || ctx.has_lifestyle("smoking"),
    },
    ModifierRule {
        label: "heavy alcohol use",
        multiplier: 1.25,
        applies_to: CARDIO_METABOLIC,
        applies: |ctx| ctx.has_lifestyle("alcohol"),
    },
    ModifierRule {
        label: "sedentary",
        multiplier: 1.15,
        applies_to: CARDIO_METABOLIC,
        applies: |ctx| ctx.has_lifestyle("sedentary"),
    },
    ModifierRule {
        label: "physically active",
        multiplier: 0.9,
        applies_to: CARDIO_METABOLIC,
        applies: |ctx| ctx.has_lifestyle("active"),
    },
    ModifierRule {
        label: "high fat or sugar diet",
        multiplier: 1.2,
        applies_to: CARDIO_METABOLIC,
        applies: |ctx| ctx.has_lifestyle("high fat") || ctx.has_lifestyle("high sugar"),
    },
];

/// Cholesterol above this raises the cardiovascular base score.
const CHOLESTEROL_ELEVATED: f64 = 200.0;
/// Glucose above this raises the metabolic base score.
const GLUCOSE_ELEVATED: f64 = 100.0;

const ELEVATED_BASE: f64 = 50.0;
const NORMAL_BASE: f64 = 10.0;

fn find(records: &[ParameterRecord], name: &str) -> Option<f64> {
    records
        .iter()
        .find(|r| r.canonical_name == name)
        .map(|r| r.value)
}

fn base_score(records: &[ParameterRecord], parameter: &str, threshold: f64) -> Option<(f64, Vec<String>)> {
    let value = find(records, parameter)?;
    if value > threshold {
        Some((ELEVATED_BASE, vec![format!("{parameter} {value:.0} mg/dL")]))
    } else {
        Some((NORMAL_BASE, vec![]))
    }
}

/// Apply the modifier table: add cardiovascular and metabolic scores
/// when their parameters are present, then scale every component risk
/// by its applicable multipliers, capped at 100. The overall score is
/// left untouched.
pub fn apply(
    risks: &mut Vec<RiskScore>,
    records: &[ParameterRecord],
    context: &DemographicContext,
) {
    if let Some((base, factors)) = base_score(records, "Cholesterol", CHOLESTEROL_ELEVATED) {
        risks.push(RiskScore {
            kind: RiskKind::Cardiovascular,
            value: base,
            level: level_for(base),
            contributing_factors: factors,
        });
    }
    if let Some((base, factors)) = base_score(records, "Glucose", GLUCOSE_ELEVATED) {
        risks.push(RiskScore {
            kind: RiskKind::Metabolic,
            value: base,
            level: level_for(base),
            contributing_factors: factors,
        });
    }

    let active: Vec<&ModifierRule> = MODIFIERS
        .iter()
        .filter(|rule| (rule.applies)(context))
        .collect();
    if active.is_empty() {
        return;
    }

    for risk in risks.iter_mut() {
        if risk.kind == RiskKind::Overall {
            continue;
        }
        let mut product = 1.0;
        for rule in active.iter().filter(|r| r.applies_to.contains(&risk.kind)) {
            product *= rule.multiplier;
            risk.contributing_factors
                .push(format!("{} (x{})", rule.label, rule.multiplier));
        }
        if product != 1.0 {
            risk.value = (risk.value * product).min(100.0);
            risk.level = level_for(risk.value);
            tracing::debug!(
                kind = ?risk.kind,
                multiplier = product,
                adjusted = risk.value,
                "Applied contextual modifiers"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::report::{ParamStatus, RiskLevel};

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

    fn anemia_risk(value: f64) -> RiskScore {
        RiskScore {
            kind: RiskKind::Anemia,
            value,
            level: level_for(value),
            contributing_factors: vec![],
        }
    }

    fn risk_of(risks: &[RiskScore], kind: RiskKind) -> &RiskScore {
        risks.iter().find(|r| r.kind == kind).unwrap()
    }

    #[test]
    fn age_brackets_are_exclusive() {
        let mut middle = vec![anemia_risk(40.0)];
        apply(&mut middle, &[], &DemographicContext { age: Some(45), ..Default::default() });
        assert!((middle[0].value - 48.0).abs() < 1e-9);

        let mut elderly = vec![anemia_risk(40.0)];
        apply(&mut elderly, &[], &DemographicContext { age: Some(70), ..Default::default() });
        assert!((elderly[0].value - 56.0).abs() < 1e-9);
    }

    #[test]
    fn cardiovascular_score_requires_cholesterol() {
        let mut risks = vec![];
        apply(&mut risks, &[], &DemographicContext::default());
        assert!(risks.iter().all(|r| r.kind != RiskKind::Cardiovascular));

        let mut risks = vec![];
        apply(&mut risks, &[record("Cholesterol", 230.0)], &DemographicContext::default());
        assert_eq!(risk_of(&risks, RiskKind::Cardiovascular).value, 50.0);
    }

    #[test]
    fn metabolic_base_scores() {
        let mut risks = vec![];
        apply(&mut risks, &[record("Glucose", 95.0)], &DemographicContext::default());
        assert_eq!(risk_of(&risks, RiskKind::Metabolic).value, 10.0);

        let mut risks = vec![];
        apply(&mut risks, &[record("Glucose", 140.0)], &DemographicContext::default());
        assert_eq!(risk_of(&risks, RiskKind::Metabolic).value, 50.0);
    }

    #[test]
    fn modifiers_multiply_and_cap_at_100() {
        let ctx = DemographicContext {
            age: Some(65),
            medical_history: vec!["Diabetes".into(), "Heart Disease".into()],
            lifestyle: vec!["smoker".into()],
            ..Default::default()
        };
        let mut risks = vec![];
        apply(&mut risks, &[record("Cholesterol", 250.0)], &ctx);
        let cardio = risk_of(&risks, RiskKind::Cardiovascular);
        // 50 * 1.4 * 1.3 * 1.4 * 1.3 = 165.6, capped.
        assert_eq!(cardio.value, 100.0);
        assert_eq!(cardio.level, RiskLevel::High);
    }

    #[test]
    fn kidney_disease_touches_anemia_but_not_metabolic() {
        let ctx = DemographicContext {
            medical_history: vec!["Kidney Disease".into()],
            ..Default::default()
        };
        let mut risks = vec![anemia_risk(40.0)];
        apply(&mut risks, &[record("Glucose", 140.0)], &ctx);
        assert!((risk_of(&risks, RiskKind::Anemia).value - 52.0).abs() < 1e-9);
        assert_eq!(risk_of(&risks, RiskKind::Metabolic).value, 50.0);
    }

    #[test]
    fn active_lifestyle_is_protective() {
        let ctx = DemographicContext {
            lifestyle: vec!["active".into()],
            ..Default::default()
        };
        let mut risks = vec![];
        apply(&mut risks, &[record("Cholesterol", 250.0)], &ctx);
        assert!((risk_of(&risks, RiskKind::Cardiovascular).value - 45.0).abs() < 1e-9);
    }

    #[test]
    fn modifier_labels_land_in_contributing_factors() {
        let ctx = DemographicContext {
            age: Some(50),
            ..Default::default()
        };
        let mut risks = vec![anemia_risk(40.0)];
        apply(&mut risks, &[], &ctx);
        assert!(risks[0]
            .contributing_factors
            .iter()
            .any(|f| f.contains("age 40-59")));
    }

    #[test]
    fn overall_is_never_modified() {
        let ctx = DemographicContext {
            age: Some(70),
            ..Default::default()
        };
        let mut risks = vec![RiskScore {
            kind: RiskKind::Overall,
            value: 80.0,
            level: RiskLevel::Low,
            contributing_factors: vec![],
        }];
        apply(&mut risks, &[], &ctx);
        assert_eq!(risks[0].value, 80.0);
    }

    #[test]
    fn empty_context_changes_nothing() {
        let mut risks = vec![anemia_risk(70.0)];
        apply(&mut risks, &[], &DemographicContext::default());
        assert_eq!(risks[0].value, 70.0);
        assert!(risks[0].contributing_factors.is_empty());
    }
}
