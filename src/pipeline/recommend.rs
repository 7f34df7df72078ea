//! Recommendation synthesis.
//!
//! Turns risk scores and findings into prioritized action items. Every
//! recommendation carries a full traceability chain: the finding that
//! triggered it, the risk it addresses, and the reasoning linking the
//! two. The output is sorted by priority, highest first.

use crate::pipeline::report::{
    PatternFinding, Priority, Recommendation, RiskKind, RiskLevel, RiskScore,
};
use crate::pipeline::rules::advanced::AdvancedRiskReport;

/// Component risks above this produce a recommendation.
const RECOMMEND_THRESHOLD: f64 = 30.0;
/// Above this the recommendation is high priority.
const HIGH_PRIORITY_THRESHOLD: f64 = 60.0;
/// Two or more component risks above this trigger the combined alert.
const COMBINED_ALERT_THRESHOLD: f64 = 50.0;

struct KindProfile {
    kind: RiskKind,
    category: &'static str,
    /// Pattern ids whose findings this kind's recommendation cites.
    related_patterns: &'static [&'static str],
    generic_finding: &'static str,
    actions: &'static [&'static str],
}

const PROFILES: &[KindProfile] = &[
    KindProfile {
        kind: RiskKind::Anemia,
        category: "Anemia Management",
        related_patterns: &["anemia", "pancytopenia"],
        generic_finding: "Hemoglobin below the reference range",
        actions: &[
            "Discuss iron studies (ferritin, serum iron, TIBC) with a physician",
            "Review diet for iron, B12 and folate intake",
            "Repeat a complete blood count in 4-6 weeks",
        ],
    },
    KindProfile {
        kind: RiskKind::Infection,
        category: "Infection Evaluation",
        related_patterns: &["bacterial_infection", "viral_infection", "leukopenia", "pancytopenia"],
        generic_finding: "White blood cell count outside the reference range",
        actions: &[
            "Correlate with symptoms such as fever or localized infection",
            "Consider a repeat count with differential",
            "Seek medical review if symptoms persist or worsen",
        ],
    },
    KindProfile {
        kind: RiskKind::Bleeding,
        category: "Bleeding Precaution",
        related_patterns: &["bleeding_risk", "pancytopenia"],
        generic_finding: "Platelet count below the reference range",
        actions: &[
            "Avoid medications that impair platelet function unless prescribed",
            "Watch for easy bruising, petechiae or prolonged bleeding",
            "Repeat platelet count promptly to confirm the trend",
        ],
    },
    KindProfile {
        kind: RiskKind::Cardiovascular,
        category: "Cardiovascular Health",
        related_patterns: &[],
        generic_finding: "Elevated cardiovascular risk profile",
        actions: &[
            "Review the full lipid panel with a physician",
            "Adopt regular aerobic exercise and a heart-healthy diet",
            "Reassess lipids in 3-6 months",
        ],
    },
    KindProfile {
        kind: RiskKind::Metabolic,
        category: "Metabolic Health",
        related_patterns: &[],
        generic_finding: "Elevated metabolic risk profile",
        actions: &[
            "Discuss fasting glucose and HbA1c testing with a physician",
            "Reduce refined sugar intake and increase physical activity",
            "Monitor weight and waist circumference",
        ],
    },
];

fn profile_for(kind: RiskKind) -> Option<&'static KindProfile> {
    PROFILES.iter().find(|p| p.kind == kind)
}

/// Prefer a matching pattern classification; fall back to the measured
/// value that drove the score, then to the profile's generic text.
fn finding_text(profile: &KindProfile, findings: &[PatternFinding], risk: &RiskScore) -> String {
    findings
        .iter()
        .find(|f| profile.related_patterns.contains(&f.pattern_id.as_str()))
        .map(|f| f.classification.clone())
        .or_else(|| risk.contributing_factors.first().cloned())
        .unwrap_or_else(|| profile.generic_finding.to_string())
}

fn level_name(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "low",
        RiskLevel::Moderate => "moderate",
        RiskLevel::High => "high",
    }
}

/// Build the prioritized recommendation list.
pub fn synthesize(
    findings: &[PatternFinding],
    risks: &[RiskScore],
    advanced: Option<&AdvancedRiskReport>,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    for risk in risks {
        if risk.kind == RiskKind::Overall || risk.value <= RECOMMEND_THRESHOLD {
            continue;
        }
        let Some(profile) = profile_for(risk.kind) else {
            continue;
        };

        let mut priority = if risk.value > HIGH_PRIORITY_THRESHOLD {
            Priority::High
        } else {
            Priority::Medium
        };
        let finding = finding_text(profile, findings, risk);
        let risk_text = format!(
            "{} risk score {:.0} ({})",
            profile.category,
            risk.value,
            level_name(risk.level)
        );
        let mut reasoning = if risk.contributing_factors.is_empty() {
            format!("{finding} drives an elevated {} risk score.", level_name(risk.level))
        } else {
            format!(
                "{finding}; contributing factors: {}.",
                risk.contributing_factors.join(", ")
            )
        };

        // The Framingham estimate sharpens the cardiovascular item when
        // it is available.
        if risk.kind == RiskKind::Cardiovascular {
            if let Some(framingham) = advanced.and_then(|a| a.framingham.as_ref()) {
                reasoning.push_str(&format!(
                    " Estimated 10-year coronary risk: {}%.",
                    framingham.risk_percent
                ));
                if framingham.category == RiskLevel::High {
                    priority = Priority::High;
                }
            }
        }

        recommendations.push(Recommendation {
            category: profile.category.to_string(),
            priority,
            finding,
            risk: risk_text,
            reasoning,
            actions: profile.actions.iter().map(|a| a.to_string()).collect(),
        });
    }

    if let Some(syndrome) = advanced.and_then(|a| a.metabolic_syndrome.as_ref()) {
        if syndrome.present {
            recommendations.push(Recommendation {
                category: "Metabolic Syndrome".to_string(),
                priority: Priority::High,
                finding: format!(
                    "Metabolic syndrome criteria met: {}",
                    syndrome.criteria_met.join(", ")
                ),
                risk: format!(
                    "{} of {} evaluated criteria positive",
                    syndrome.criteria_met.len(),
                    syndrome.criteria_evaluated
                ),
                reasoning: "Three or more concurrent criteria indicate metabolic syndrome, \
                            which compounds cardiovascular and diabetes risk."
                    .to_string(),
                actions: vec![
                    "Seek a comprehensive metabolic evaluation".to_string(),
                    "Prioritize weight management and regular exercise".to_string(),
                ],
            });
        }
    }

    let elevated = risks
        .iter()
        .filter(|r| r.kind != RiskKind::Overall && r.value > COMBINED_ALERT_THRESHOLD)
        .count();
    if elevated >= 2 {
        let kinds: Vec<String> = risks
            .iter()
            .filter(|r| r.kind != RiskKind::Overall && r.value > COMBINED_ALERT_THRESHOLD)
            .filter_map(|r| profile_for(r.kind).map(|p| p.category.to_string()))
            .collect();
        recommendations.push(Recommendation {
            category: "Combined Risk Alert".to_string(),
            priority: Priority::High,
            finding: format!("Multiple elevated risk scores: {}", kinds.join(", ")),
            risk: format!("{elevated} component risks above {COMBINED_ALERT_THRESHOLD:.0}"),
            reasoning: "Several independent risk domains are elevated at once; combined \
                        abnormalities warrant prompt clinical review rather than isolated followup."
                .to_string(),
            actions: vec!["Consult a physician about the full report soon".to_string()],
        });
    }

    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    tracing::info!(count = recommendations.len(), "Recommendations synthesized");
    recommendations
}
