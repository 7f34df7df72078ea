//! Consensus merger.
//!
//! Groups candidates from all agents by canonical name and elects one
//! winner per group with a fixed tie-break ladder:
//!
//!   1. candidates that carry a unit beat those that do not,
//!   2. among those, the value reported by the most agents (within a
//!      small tolerance) wins,
//!   3. remaining ties go to the reconstruction agent, then by agent
//!      order, so the merge is deterministic and idempotent.
//!
//! Every grouped candidate is retained on the record (winner first) so
//! downstream stages can audit disagreement; `agent_agreement` counts
//! distinct agents whose value matched the winner.

use std::collections::BTreeMap;

use crate::pipeline::report::{ParamStatus, ParameterRecord};

use super::types::{AgentId, ParameterCandidate};

/// Two readings of the same parameter count as agreeing within this.
pub const VALUE_TOLERANCE: f64 = 1e-6;

/// Lower rank wins ties. Reconstruction has the widest context window,
/// so it is the preferred arbiter.
fn agent_rank(id: AgentId) -> u8 {
    match id {
        AgentId::Structured => 0,
        AgentId::Reconstruction => 1,
        AgentId::Tabular => 2,
        AgentId::Normalization => 3,
    }
}

fn values_agree(a: f64, b: f64) -> bool {
    (a - b).abs() <= VALUE_TOLERANCE
}

/// How many distinct agents in the group report the same value. Counting
/// agents rather than candidates keeps a parameter printed twice in the
/// document from outvoting two agents that agree on another value.
fn peer_count(group: &[ParameterCandidate], value: f64) -> usize {
    let mut agents: Vec<AgentId> = group
        .iter()
        .filter(|c| values_agree(c.value, value))
        .map(|c| c.source_agent)
        .collect();
    agents.sort_by_key(|id| agent_rank(*id));
    agents.dedup();
    agents.len()
}

/// Merge all agents' candidates into one record per canonical name.
/// Records come out sorted by name; re-merging the output's winner set
/// yields the same winners.
pub fn merge(candidates: Vec<ParameterCandidate>) -> Vec<ParameterRecord> {
    let mut groups: BTreeMap<String, Vec<ParameterCandidate>> = BTreeMap::new();
    for candidate in candidates {
        groups.entry(candidate.name.clone()).or_default().push(candidate);
    }

    let mut records = Vec::with_capacity(groups.len());
    for (name, mut group) in groups {
        // Deterministic base order regardless of arrival order.
        group.sort_by(|a, b| {
            agent_rank(a.source_agent)
                .cmp(&agent_rank(b.source_agent))
                .then(a.value.total_cmp(&b.value))
        });

        let winner_index = (0..group.len())
            .min_by(|&a, &b| {
                let (ca, cb) = (&group[a], &group[b]);
                cb.unit
                    .is_some()
                    .cmp(&ca.unit.is_some())
                    .then(peer_count(&group, cb.value).cmp(&peer_count(&group, ca.value)))
                    .then(agent_rank(ca.source_agent).cmp(&agent_rank(cb.source_agent)))
                    .then(a.cmp(&b))
            })
            .unwrap_or(0);

        let winner = group[winner_index].clone();
        let agent_agreement = peer_count(&group, winner.value);

        if group.len() > 1 {
            let agreeing = group
                .iter()
                .filter(|c| values_agree(c.value, winner.value))
                .count();
            let disagreeing = group.len() - agreeing;
            if disagreeing > 0 {
                tracing::debug!(
                    parameter = %name,
                    winner = winner.value,
                    disagreeing,
                    "Merged conflicting candidates"
                );
            }
        }

        // Winner first in the audit trail.
        group.swap(0, winner_index);

        records.push(ParameterRecord {
            canonical_name: name,
            value: winner.value,
            unit: winner.unit,
            reference_range: None,
            status: ParamStatus::Unknown,
            supporting_candidates: group,
            agent_agreement,
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, value: f64, unit: Option<&str>, agent: AgentId) -> ParameterCandidate {
        ParameterCandidate {
            name: name.to_string(),
            value,
            unit: unit.map(str::to_string),
            raw_text: format!("{name} {value}"),
            source_agent: agent,
            confidence: 0.8,
            status_hint: None,
        }
    }

    #[test]
    fn groups_by_canonical_name() {
        let records = merge(vec![
            candidate("Hemoglobin", 12.5, Some("g/dL"), AgentId::Reconstruction),
            candidate("Hemoglobin", 12.5, Some("g/dL"), AgentId::Tabular),
            candidate("Glucose", 95.0, Some("mg/dL"), AgentId::Normalization),
        ]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].canonical_name, "Glucose");
        assert_eq!(records[1].canonical_name, "Hemoglobin");
        assert_eq!(records[1].agent_agreement, 2);
    }

    #[test]
    fn unit_bearing_candidate_beats_unitless() {
        let records = merge(vec![
            candidate("Hemoglobin", 12.5, None, AgentId::Reconstruction),
            candidate("Hemoglobin", 12.5, Some("g/dL"), AgentId::Normalization),
        ]);
        assert_eq!(records[0].unit.as_deref(), Some("g/dL"));
        // Value agreed, so both agents count.
        assert_eq!(records[0].agent_agreement, 2);
    }

    #[test]
    fn majority_value_wins() {
        let records = merge(vec![
            candidate("Glucose", 95.0, Some("mg/dL"), AgentId::Reconstruction),
            candidate("Glucose", 950.0, Some("mg/dL"), AgentId::Tabular),
            candidate("Glucose", 95.0, Some("mg/dL"), AgentId::Normalization),
        ]);
        assert_eq!(records[0].value, 95.0);
        assert_eq!(records[0].agent_agreement, 2);
        assert_eq!(records[0].supporting_candidates.len(), 3);
    }

    #[test]
    fn two_way_split_falls_to_reconstruction() {
        let records = merge(vec![
            candidate("MCV", 72.0, Some("fL"), AgentId::Reconstruction),
            candidate("MCV", 92.0, Some("fL"), AgentId::Tabular),
        ]);
        assert_eq!(records[0].value, 72.0);
        assert_eq!(records[0].agent_agreement, 1);
    }

    #[test]
    fn duplicate_readings_from_one_agent_do_not_outvote_two_agents() {
        // Reconstruction saw the parameter printed twice; Tabular and
        // Normalization independently agree on a different value.
        let records = merge(vec![
            candidate("Glucose", 950.0, Some("mg/dL"), AgentId::Reconstruction),
            candidate("Glucose", 950.0, Some("mg/dL"), AgentId::Reconstruction),
            candidate("Glucose", 95.0, Some("mg/dL"), AgentId::Tabular),
            candidate("Glucose", 95.0, Some("mg/dL"), AgentId::Normalization),
        ]);
        assert_eq!(records[0].value, 95.0);
        assert_eq!(records[0].agent_agreement, 2);
        assert_eq!(records[0].supporting_candidates.len(), 4);
    }

    #[test]
    fn winner_is_first_supporting_candidate() {
        let records = merge(vec![
            candidate("Hemoglobin", 12.5, None, AgentId::Reconstruction),
            candidate("Hemoglobin", 11.0, Some("g/dL"), AgentId::Normalization),
        ]);
        assert_eq!(records[0].supporting_candidates[0].value, records[0].value);
    }

    #[test]
    fn merge_is_idempotent() {
        let input = vec![
            candidate("Hemoglobin", 12.5, Some("g/dL"), AgentId::Reconstruction),
            candidate("Hemoglobin", 12.4, Some("g/dL"), AgentId::Tabular),
            candidate("Hemoglobin", 12.5, None, AgentId::Normalization),
        ];
        let first = merge(input);
        let winners: Vec<ParameterCandidate> = first
            .iter()
            .map(|r| r.supporting_candidates[0].clone())
            .collect();
        let second = merge(winners);
        assert_eq!(second[0].value, first[0].value);
        assert_eq!(second[0].unit, first[0].unit);
    }

    #[test]
    fn order_independent() {
        let a = vec![
            candidate("Glucose", 95.0, Some("mg/dL"), AgentId::Reconstruction),
            candidate("Glucose", 950.0, Some("mg/dL"), AgentId::Tabular),
            candidate("Glucose", 95.0, None, AgentId::Normalization),
        ];
        let mut b = a.clone();
        b.reverse();
        let (ra, rb) = (merge(a), merge(b));
        assert_eq!(ra[0].value, rb[0].value);
        assert_eq!(ra[0].unit, rb[0].unit);
        assert_eq!(ra[0].agent_agreement, rb[0].agent_agreement);
    }

    #[test]
    fn status_starts_unknown_with_no_range() {
        let records = merge(vec![candidate(
            "Hemoglobin",
            12.5,
            Some("g/dL"),
            AgentId::Reconstruction,
        )]);
        assert_eq!(records[0].status, ParamStatus::Unknown);
        assert!(records[0].reference_range.is_none());
    }

    #[test]
    fn structured_source_outranks_all() {
        let records = merge(vec![
            candidate("Glucose", 96.0, Some("mg/dL"), AgentId::Reconstruction),
            candidate("Glucose", 95.0, Some("mg/dL"), AgentId::Structured),
        ]);
        assert_eq!(records[0].value, 95.0);
    }
}
