//! Bundle matcher.
//!
//! Evaluates every compiled rule against every patient's procedure set. Membership tests are
//! hashed, so the cost is proportional to patients × bundles × rule size and independent of
//! how many requisition rows a patient has.

use crate::patient_index::PatientIndex;
use crate::rules::{BundleRule, RuleTable};
use oci_types::{BundleId, PatientId, ProcedureCode};
use std::collections::{BTreeMap, HashSet};

/// Outcome of one rule evaluated against one patient.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BundleMatch {
    pub closed: bool,
    /// Required codes plus one representative per alternative group. Empty unless closed.
    pub relevant: Vec<ProcedureCode>,
    /// Optional codes present. Empty unless closed.
    pub optional: Vec<ProcedureCode>,
}

impl BundleMatch {
    /// Every code that contributed to the closed bundle.
    pub fn contributing_codes(&self) -> impl Iterator<Item = &ProcedureCode> {
        self.relevant.iter().chain(self.optional.iter())
    }
}

/// Match results keyed by patient, then by bundle.
pub type MatchResults = BTreeMap<PatientId, BTreeMap<BundleId, BundleMatch>>;

/// Evaluates the full patient × bundle cross product.
///
/// A rule without required codes and without alternative groups closes only when
/// `close_empty_bundles` is set.
pub fn match_bundles(
    index: &PatientIndex,
    rules: &RuleTable,
    close_empty_bundles: bool,
) -> MatchResults {
    let mut results = MatchResults::new();
    let mut closed = 0usize;

    for (patient_id, codes) in index {
        let per_patient = results.entry(patient_id.clone()).or_default();
        for (bundle_id, rule) in rules {
            let outcome = if rule.has_no_closing_criteria() && !close_empty_bundles {
                BundleMatch::default()
            } else {
                evaluate(rule, codes)
            };
            if outcome.closed {
                closed += 1;
            }
            per_patient.insert(bundle_id.clone(), outcome);
        }
    }

    tracing::info!(
        "{} bundle instances closed across {} patients and {} bundles",
        closed,
        index.len(),
        rules.len()
    );
    results
}

/// Evaluates a single rule against one patient's codes.
///
/// Required codes are all checked even after one is missing, so the partial list is complete
/// while evaluating; it is discarded unless the bundle closes.
pub fn evaluate(rule: &BundleRule, codes: &HashSet<ProcedureCode>) -> BundleMatch {
    let mut relevant = Vec::new();

    let mut required_ok = true;
    for code in &rule.required {
        if codes.contains(code) {
            relevant.push(code.clone());
        } else {
            required_ok = false;
        }
    }

    let mut alternatives_ok = true;
    for group in &rule.alternative_groups {
        match group.codes.iter().find(|code| codes.contains(*code)) {
            Some(code) => relevant.push(code.clone()),
            None => alternatives_ok = false,
        }
    }

    if !(required_ok && alternatives_ok) {
        return BundleMatch::default();
    }

    let optional = rule
        .optional
        .iter()
        .filter(|code| codes.contains(*code))
        .cloned()
        .collect();

    BundleMatch {
        closed: true,
        relevant,
        optional,
    }
}
