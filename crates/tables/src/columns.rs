//! Column-name mapping for the input tables.
//!
//! Defaults follow the column names of the requisition export and the auxiliary catalogues.
//! Any subset can be overridden from a YAML document.

use crate::{TableError, TableResult};
use serde::Deserialize;
use std::path::Path;

/// Column names for every input table, plus the field delimiter shared by all of them.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    pub delimiter: char,
    pub requisitions: RequisitionColumns,
    pub rules: RuleColumns,
    pub diagnoses: DiagnosisColumns,
    pub bundle_names: BundleNameColumns,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            delimiter: ',',
            requisitions: RequisitionColumns::default(),
            rules: RuleColumns::default(),
            diagnoses: DiagnosisColumns::default(),
            bundle_names: BundleNameColumns::default(),
        }
    }
}

impl ColumnMapping {
    pub fn from_yaml_str(yaml_text: &str) -> TableResult<Self> {
        serde_yaml::from_str(yaml_text).map_err(TableError::Mapping)
    }

    pub fn from_yaml_file(path: &Path) -> TableResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RequisitionColumns {
    pub record_id: String,
    pub patient_id: String,
    pub procedure_code: String,
    pub requested_at: String,
    pub executed_at: String,
    pub specialty_code: String,
    pub diagnosis_code: String,
}

impl Default for RequisitionColumns {
    fn default() -> Self {
        Self {
            record_id: "id_registro".into(),
            patient_id: "id_paciente".into(),
            procedure_code: "co_procedimento".into(),
            requested_at: "dt_solicitacao".into(),
            executed_at: "dt_execucao".into(),
            specialty_code: "cbo_executante".into(),
            diagnosis_code: "cid_motivo".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RuleColumns {
    pub bundle_id: String,
    pub procedure_code: String,
    pub compatibility_type: String,
    pub alternative_group: String,
}

impl Default for RuleColumns {
    fn default() -> Self {
        Self {
            bundle_id: "CO_OCI".into(),
            procedure_code: "CO_PROCEDIMENTO".into(),
            compatibility_type: "TP_COMPATIBILIDADE".into(),
            alternative_group: "OBRIGATORIO_ALTERNATIVO".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosisColumns {
    pub bundle_id: String,
    pub diagnosis_code: String,
}

impl Default for DiagnosisColumns {
    fn default() -> Self {
        Self {
            bundle_id: "CO_OCI".into(),
            diagnosis_code: "CO_CID".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BundleNameColumns {
    pub bundle_id: String,
    pub display_name: String,
}

impl Default for BundleNameColumns {
    fn default() -> Self {
        Self {
            bundle_id: "co_oci".into(),
            display_name: "no_oci".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_other_defaults() {
        let mapping = ColumnMapping::from_yaml_str(
            "delimiter: \";\"\nrequisitions:\n  patient_id: cns_paciente\n",
        )
        .expect("parse mapping");
        assert_eq!(mapping.delimiter, ';');
        assert_eq!(mapping.requisitions.patient_id, "cns_paciente");
        assert_eq!(mapping.requisitions.record_id, "id_registro");
        assert_eq!(mapping.rules, RuleColumns::default());
    }

    #[test]
    fn rejects_unknown_columns() {
        let err = ColumnMapping::from_yaml_str("rules:\n  bundle: X\n").expect_err("unknown key");
        match err {
            TableError::Mapping(e) => assert!(e.to_string().contains("bundle")),
            other => panic!("expected Mapping error, got {other:?}"),
        }
    }
}
