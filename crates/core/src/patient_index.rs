//! Per-patient procedure sets.

use crate::requisition::Requisition;
use oci_types::{PatientId, ProcedureCode};
use std::collections::{BTreeMap, HashSet};

/// Effective procedure codes held by each patient, used only for membership tests.
pub type PatientIndex = BTreeMap<PatientId, HashSet<ProcedureCode>>;

/// Groups requisitions by patient, collapsing duplicate codes.
///
/// Every distinct patient id in `rows` appears exactly once as a key.
pub fn index_patients(rows: &[Requisition]) -> PatientIndex {
    let mut index = PatientIndex::new();
    for row in rows {
        index
            .entry(row.patient_id.clone())
            .or_default()
            .insert(row.match_code.clone());
    }
    tracing::info!("indexed {} patients from {} requisitions", index.len(), rows.len());
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requisition::{ingest, RawRequisition};
    use crate::CoreConfig;

    #[test]
    fn groups_codes_per_patient_and_collapses_duplicates() {
        let raw = |record: &str, patient: &str, code: &str| RawRequisition {
            record_id: Some(record.into()),
            patient_id: Some(patient.into()),
            procedure_code: Some(code.into()),
            ..Default::default()
        };
        let rows = ingest(
            vec![
                raw("1", "P1", "A"),
                raw("2", "P1", "A"),
                raw("3", "P2", "B"),
                raw("4", "P1", "C"),
            ],
            &CoreConfig::default(),
        );

        let index = index_patients(&rows);
        assert_eq!(index.len(), 2);

        let p1 = &index[&PatientId::new("P1").expect("valid id")];
        assert_eq!(p1.len(), 2);
        assert!(p1.contains("A"));
        assert!(p1.contains("C"));
        assert!(index[&PatientId::new("P2").expect("valid id")].contains("B"));
    }

    #[test]
    fn empty_input_gives_empty_index() {
        assert!(index_patients(&[]).is_empty());
    }
}
