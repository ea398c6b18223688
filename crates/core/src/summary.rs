//! Bundle-instance summarizer.
//!
//! Aggregates every row of one bundle instance into a qualification tier and a workflow status,
//! then broadcasts both back onto each member row. Rows outside a bundle are left untouched.

use crate::annotate::AnnotatedRow;
use oci_types::BundleInstanceKey;
use std::collections::BTreeMap;

/// How well the diagnoses of a bundle instance fit the bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QualificationTier {
    /// Every member row has a compatible diagnosis.
    Qualified,
    /// Some member rows do.
    Potential,
    /// None do.
    Disqualified,
}

impl QualificationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qualified => "qualified",
            Self::Potential => "potential",
            Self::Disqualified => "disqualified",
        }
    }
}

/// Execution progress of a bundle instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkflowStatus {
    /// Nothing executed yet.
    Queued,
    /// Some but not all member rows executed.
    Started,
    /// Everything executed and the last execution was a terminal procedure.
    Completed,
    /// Everything executed but the last execution was not terminal.
    FollowUpRequired,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::FollowUpRequired => "follow-up-required",
        }
    }
}

/// Adds tier and status to every bundled row.
///
/// `terminal_prefixes` are matched against the raw procedure code of the row with the latest
/// execution date. On ties the later row in `rows` order wins.
pub fn summarize(mut rows: Vec<AnnotatedRow>, terminal_prefixes: &[String]) -> Vec<AnnotatedRow> {
    let mut members: BTreeMap<BundleInstanceKey, Vec<usize>> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        if let Some(key) = &row.instance {
            members.entry(key.clone()).or_default().push(idx);
        }
    }

    let summaries: Vec<(Vec<usize>, QualificationTier, WorkflowStatus)> = members
        .into_values()
        .map(|idxs| {
            let group: Vec<&AnnotatedRow> = idxs.iter().map(|&i| &rows[i]).collect();
            let tier = tier_of(&group);
            let status = status_of(&group, terminal_prefixes);
            (idxs, tier, status)
        })
        .collect();

    tracing::info!("summarized {} bundle instances", summaries.len());

    for (idxs, tier, status) in summaries {
        for idx in idxs {
            rows[idx].tier = Some(tier);
            rows[idx].status = Some(status);
        }
    }
    rows
}

fn tier_of(group: &[&AnnotatedRow]) -> QualificationTier {
    let compatible = group.iter().filter(|r| r.diagnosis_compatible).count();
    if compatible == group.len() {
        QualificationTier::Qualified
    } else if compatible == 0 {
        QualificationTier::Disqualified
    } else {
        QualificationTier::Potential
    }
}

fn status_of(group: &[&AnnotatedRow], terminal_prefixes: &[String]) -> WorkflowStatus {
    let executed = group.iter().filter(|r| r.requisition.is_executed()).count();
    if executed == 0 {
        return WorkflowStatus::Queued;
    }
    if executed < group.len() {
        return WorkflowStatus::Started;
    }

    let last = group.iter().max_by_key(|r| r.requisition.executed_at);
    let terminal = last.is_some_and(|r| {
        let code = r.requisition.procedure_code.as_str();
        terminal_prefixes.iter().any(|p| code.starts_with(p.as_str()))
    });

    if terminal {
        WorkflowStatus::Completed
    } else {
        WorkflowStatus::FollowUpRequired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::Action;
    use crate::requisition::{ingest, RawRequisition};
    use crate::CoreConfig;
    use oci_types::{BundleId, PatientId};

    fn bundled(
        record: &str,
        patient: &str,
        bundle: &str,
        code: &str,
        executed: Option<&str>,
        compatible: bool,
    ) -> AnnotatedRow {
        let raw = RawRequisition {
            record_id: Some(record.into()),
            patient_id: Some(patient.into()),
            procedure_code: Some(code.into()),
            executed_at: executed.map(str::to_string),
            ..Default::default()
        };
        let requisition = ingest(vec![raw], &CoreConfig::default())
            .pop()
            .expect("valid requisition");
        let bundle_id = BundleId::new(bundle).expect("valid id");
        let patient_id = PatientId::new(patient).expect("valid id");
        AnnotatedRow {
            action: Some(Action::decide(requisition.is_executed(), compatible)),
            requisition,
            bundle_id: Some(bundle_id.clone()),
            in_bundle: true,
            diagnosis_compatible: compatible,
            display_name: None,
            instance: Some(BundleInstanceKey::new(patient_id, bundle_id)),
            tier: None,
            status: None,
        }
    }

    fn terminal() -> Vec<String> {
        vec!["0301010".to_string()]
    }

    #[test]
    fn tier_reflects_diagnosis_compatibility_mix() {
        let rows = summarize(
            vec![
                bundled("1", "P1", "100", "A", None, true),
                bundled("2", "P1", "100", "B", None, true),
                bundled("3", "P2", "100", "A", None, true),
                bundled("4", "P2", "100", "B", None, false),
                bundled("5", "P3", "100", "A", None, false),
            ],
            &terminal(),
        );
        assert_eq!(rows[0].tier, Some(QualificationTier::Qualified));
        assert_eq!(rows[1].tier, Some(QualificationTier::Qualified));
        assert_eq!(rows[2].tier, Some(QualificationTier::Potential));
        assert_eq!(rows[3].tier, Some(QualificationTier::Potential));
        assert_eq!(rows[4].tier, Some(QualificationTier::Disqualified));
    }

    #[test]
    fn status_follows_execution_progress() {
        let rows = summarize(
            vec![
                bundled("1", "P1", "100", "A", None, true),
                bundled("2", "P1", "100", "B", None, true),
                bundled("3", "P2", "100", "A", Some("2025-01-01"), true),
                bundled("4", "P2", "100", "B", None, true),
            ],
            &terminal(),
        );
        assert_eq!(rows[0].status, Some(WorkflowStatus::Queued));
        assert_eq!(rows[1].status, Some(WorkflowStatus::Queued));
        assert_eq!(rows[2].status, Some(WorkflowStatus::Started));
        assert_eq!(rows[3].status, Some(WorkflowStatus::Started));
    }

    #[test]
    fn fully_executed_instance_checks_latest_procedure() {
        let rows = summarize(
            vec![
                bundled("1", "P1", "100", "0211020", Some("2025-01-01"), true),
                bundled("2", "P1", "100", "0301010072", Some("2025-02-01"), true),
                bundled("3", "P2", "100", "0301010072", Some("2025-01-01"), true),
                bundled("4", "P2", "100", "0211020", Some("2025-02-01"), true),
            ],
            &terminal(),
        );
        assert_eq!(rows[0].status, Some(WorkflowStatus::Completed));
        assert_eq!(rows[1].status, Some(WorkflowStatus::Completed));
        assert_eq!(rows[2].status, Some(WorkflowStatus::FollowUpRequired));
        assert_eq!(rows[3].status, Some(WorkflowStatus::FollowUpRequired));
    }

    #[test]
    fn instances_are_keyed_by_patient_and_bundle() {
        let rows = summarize(
            vec![
                bundled("1", "P1", "100", "A", None, true),
                bundled("1", "P1", "200", "A", None, false),
            ],
            &terminal(),
        );
        assert_eq!(rows[0].tier, Some(QualificationTier::Qualified));
        assert_eq!(rows[1].tier, Some(QualificationTier::Disqualified));
    }

    #[test]
    fn unbundled_rows_get_no_summary() {
        let mut row = bundled("1", "P1", "100", "A", None, true);
        row.bundle_id = None;
        row.instance = None;
        row.in_bundle = false;
        row.action = None;

        let rows = summarize(vec![row], &terminal());
        assert!(rows[0].tier.is_none());
        assert!(rows[0].status.is_none());
    }

    #[test]
    fn latest_execution_tie_goes_to_later_row() {
        let terminal_last = summarize(
            vec![
                bundled("1", "P1", "100", "0211020", Some("2025-01-10"), true),
                bundled("2", "P1", "100", "0301010", Some("2025-01-10"), true),
            ],
            &terminal(),
        );
        assert_eq!(terminal_last[0].status, Some(WorkflowStatus::Completed));

        let terminal_first = summarize(
            vec![
                bundled("1", "P1", "100", "0301010", Some("2025-01-10"), true),
                bundled("2", "P1", "100", "0211020", Some("2025-01-10"), true),
            ],
            &terminal(),
        );
        assert_eq!(terminal_first[0].status, Some(WorkflowStatus::FollowUpRequired));
    }
}
