//! Record annotator.
//!
//! Projects closed matches back onto requisition rows. A row belongs to a bundle when its
//! effective code contributed to that bundle's closed match for the same patient; a row that
//! contributed to several bundles is exploded into one output row per bundle.

use crate::catalog::{BundleNameCatalog, DiagnosisCatalog};
use crate::matcher::MatchResults;
use crate::requisition::Requisition;
use crate::summary::{QualificationTier, WorkflowStatus};
use oci_types::{BundleId, BundleInstanceKey, PatientId, ProcedureCode};
use std::collections::{BTreeSet, HashMap};

/// Recommended administrative action for a bundled row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    BillAsBundle,
    ReviewDiagnosisBeforeBilling,
    ExecuteAsBundle,
    ReviewDiagnosisBeforeExecuting,
}

impl Action {
    /// Decision table over execution and diagnosis compatibility.
    pub fn decide(executed: bool, compatible: bool) -> Self {
        match (executed, compatible) {
            (true, true) => Self::BillAsBundle,
            (true, false) => Self::ReviewDiagnosisBeforeBilling,
            (false, true) => Self::ExecuteAsBundle,
            (false, false) => Self::ReviewDiagnosisBeforeExecuting,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BillAsBundle => "Bill as bundle",
            Self::ReviewDiagnosisBeforeBilling => "Review diagnosis before billing as bundle",
            Self::ExecuteAsBundle => "Execute as bundle",
            Self::ReviewDiagnosisBeforeExecuting => "Review diagnosis before executing as bundle",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requisition row with its bundle annotations.
///
/// Rows outside every closed bundle have `bundle_id`, `instance` and `action` unset,
/// `in_bundle` and `diagnosis_compatible` false. Every row with `in_bundle` set carries one of
/// the four actions; unmatched rows only reach the output when `keep_unmatched` is configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedRow {
    pub requisition: Requisition,
    pub bundle_id: Option<BundleId>,
    pub in_bundle: bool,
    pub diagnosis_compatible: bool,
    pub display_name: Option<String>,
    pub instance: Option<BundleInstanceKey>,
    pub action: Option<Action>,
    pub tier: Option<QualificationTier>,
    pub status: Option<WorkflowStatus>,
}

impl AnnotatedRow {
    fn unmatched(requisition: Requisition) -> Self {
        Self {
            requisition,
            bundle_id: None,
            in_bundle: false,
            diagnosis_compatible: false,
            display_name: None,
            instance: None,
            action: None,
            tier: None,
            status: None,
        }
    }
}

/// Annotates every requisition row against the closed matches.
///
/// Output preserves input order; exploded rows follow each other in bundle-id order.
pub fn annotate(
    rows: &[Requisition],
    matches: &MatchResults,
    diagnoses: &DiagnosisCatalog,
    names: &BundleNameCatalog,
) -> Vec<AnnotatedRow> {
    let membership = bundle_membership(matches);
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let key = (row.patient_id.clone(), row.match_code.clone());
        let Some(bundles) = membership.get(&key) else {
            out.push(AnnotatedRow::unmatched(row.clone()));
            continue;
        };

        for bundle_id in bundles {
            let compatible = diagnoses.is_compatible(bundle_id, row.diagnosis_code.as_deref());
            out.push(AnnotatedRow {
                requisition: row.clone(),
                bundle_id: Some(bundle_id.clone()),
                in_bundle: true,
                diagnosis_compatible: compatible,
                display_name: names.name(bundle_id).map(str::to_string),
                instance: Some(BundleInstanceKey::new(
                    row.patient_id.clone(),
                    bundle_id.clone(),
                )),
                action: Some(Action::decide(row.is_executed(), compatible)),
                tier: None,
                status: None,
            });
        }
    }

    let bundled = out.iter().filter(|r| r.in_bundle).count();
    tracing::info!(
        "annotated {} requisitions into {} rows ({} in a bundle)",
        rows.len(),
        out.len(),
        bundled
    );
    out
}

/// Bundle ids per (patient, effective code), from every closed match's contributing codes.
fn bundle_membership(
    matches: &MatchResults,
) -> HashMap<(PatientId, ProcedureCode), BTreeSet<BundleId>> {
    let mut membership: HashMap<(PatientId, ProcedureCode), BTreeSet<BundleId>> = HashMap::new();
    for (patient_id, per_bundle) in matches {
        for (bundle_id, result) in per_bundle.iter().filter(|(_, m)| m.closed) {
            for code in result.contributing_codes() {
                membership
                    .entry((patient_id.clone(), code.clone()))
                    .or_default()
                    .insert(bundle_id.clone());
            }
        }
    }
    membership
}
