//! CSV readers for the requisition table and the three catalogues.
//!
//! Readers check headers before reading any row: a missing required column fails the whole
//! table. Field values are handed to the core untouched; trimming and validation happen there.

use crate::columns::ColumnMapping;
use crate::{TableError, TableResult};
use csv::StringRecord;
use oci_core::{BundleNameRow, DiagnosisRow, PipelineInput, RawRequisition, RuleRow};
use std::io::Read;
use std::path::Path;

/// Rule catalogue file name inside a catalogue directory.
pub const RULES_FILE_NAME: &str = "pacotes.csv";

/// Diagnosis-compatibility catalogue file name inside a catalogue directory.
pub const DIAGNOSES_FILE_NAME: &str = "cid.csv";

/// Bundle-name catalogue file name inside a catalogue directory.
pub const BUNDLE_NAMES_FILE_NAME: &str = "oci_nome.csv";

/// Requisition rows plus the header order they were read with.
#[derive(Clone, Debug, Default)]
pub struct RequisitionTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRequisition>,
}

/// The three reference catalogues.
#[derive(Clone, Debug, Default)]
pub struct Catalogs {
    pub rules: Vec<RuleRow>,
    pub diagnoses: Vec<DiagnosisRow>,
    pub bundle_names: Vec<BundleNameRow>,
}

impl Catalogs {
    /// Combines the catalogues with a requisition table into one pipeline input.
    pub fn into_input(self, requisitions: Vec<RawRequisition>) -> PipelineInput {
        PipelineInput {
            requisitions,
            rules: self.rules,
            diagnoses: self.diagnoses,
            bundle_names: self.bundle_names,
        }
    }
}

struct Headers {
    table: &'static str,
    names: Vec<String>,
}

impl Headers {
    fn new(table: &'static str, record: &StringRecord) -> Self {
        let names = record
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        Self { table, names }
    }

    fn find(&self, column: &str) -> Option<usize> {
        self.names.iter().position(|h| h == column)
    }

    fn require(&self, column: &str) -> TableResult<usize> {
        self.find(column).ok_or_else(|| TableError::MissingColumn {
            table: self.table,
            column: column.to_string(),
        })
    }
}

fn field(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i)).map(str::to_string)
}

fn csv_reader<R: Read>(input: R, mapping: &ColumnMapping) -> TableResult<csv::Reader<R>> {
    let delimiter = u8::try_from(mapping.delimiter)
        .map_err(|_| TableError::InvalidDelimiter(mapping.delimiter))?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(input))
}

fn open(path: &Path) -> TableResult<std::fs::File> {
    std::fs::File::open(path).map_err(|source| TableError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the requisition table.
///
/// # Errors
///
/// Returns `TableError::MissingColumn` if the record id, patient id, procedure code or
/// execution date column is absent, and `TableError::Csv` for malformed CSV.
pub fn read_requisitions<R: Read>(
    input: R,
    mapping: &ColumnMapping,
) -> TableResult<RequisitionTable> {
    let cols = &mapping.requisitions;
    let mut reader = csv_reader(input, mapping)?;
    let headers = Headers::new("requisitions", reader.headers()?);

    let record_id = headers.require(&cols.record_id)?;
    let patient_id = headers.require(&cols.patient_id)?;
    let procedure_code = headers.require(&cols.procedure_code)?;
    let executed_at = headers.require(&cols.executed_at)?;
    let requested_at = headers.find(&cols.requested_at);
    let specialty_code = headers.find(&cols.specialty_code);
    let diagnosis_code = headers.find(&cols.diagnosis_code);

    let mapped = [
        Some(record_id),
        Some(patient_id),
        Some(procedure_code),
        Some(executed_at),
        requested_at,
        specialty_code,
        diagnosis_code,
    ];
    let extra: Vec<(usize, String)> = headers
        .names
        .iter()
        .enumerate()
        .filter(|(idx, _)| !mapped.contains(&Some(*idx)))
        .map(|(idx, name)| (idx, name.clone()))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(RawRequisition {
            record_id: field(&record, Some(record_id)),
            patient_id: field(&record, Some(patient_id)),
            procedure_code: field(&record, Some(procedure_code)),
            requested_at: field(&record, requested_at),
            executed_at: field(&record, Some(executed_at)),
            specialty_code: field(&record, specialty_code),
            diagnosis_code: field(&record, diagnosis_code),
            extra_columns: extra
                .iter()
                .map(|(idx, name)| {
                    (name.clone(), field(&record, Some(*idx)).unwrap_or_default())
                })
                .collect(),
        });
    }

    tracing::info!("read {} requisition rows", rows.len());
    Ok(RequisitionTable {
        headers: headers.names,
        rows,
    })
}

pub fn read_requisitions_path(
    path: &Path,
    mapping: &ColumnMapping,
) -> TableResult<RequisitionTable> {
    read_requisitions(open(path)?, mapping)
}

/// Reads the bundle-composition catalogue. The alternative-group column is optional.
pub fn read_rules<R: Read>(input: R, mapping: &ColumnMapping) -> TableResult<Vec<RuleRow>> {
    let cols = &mapping.rules;
    let mut reader = csv_reader(input, mapping)?;
    let headers = Headers::new("rules", reader.headers()?);

    let bundle_id = headers.require(&cols.bundle_id)?;
    let procedure_code = headers.require(&cols.procedure_code)?;
    let compatibility_type = headers.require(&cols.compatibility_type)?;
    let alternative_group = headers.find(&cols.alternative_group);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(RuleRow {
            bundle_id: field(&record, Some(bundle_id)).unwrap_or_default(),
            procedure_code: field(&record, Some(procedure_code)).unwrap_or_default(),
            compatibility_type: field(&record, Some(compatibility_type)).unwrap_or_default(),
            alternative_group: field(&record, alternative_group),
        });
    }
    Ok(rows)
}

pub fn read_diagnoses<R: Read>(
    input: R,
    mapping: &ColumnMapping,
) -> TableResult<Vec<DiagnosisRow>> {
    let cols = &mapping.diagnoses;
    let mut reader = csv_reader(input, mapping)?;
    let headers = Headers::new("diagnoses", reader.headers()?);

    let bundle_id = headers.require(&cols.bundle_id)?;
    let diagnosis_code = headers.require(&cols.diagnosis_code)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(DiagnosisRow {
            bundle_id: field(&record, Some(bundle_id)).unwrap_or_default(),
            diagnosis_code: field(&record, Some(diagnosis_code)).unwrap_or_default(),
        });
    }
    Ok(rows)
}

pub fn read_bundle_names<R: Read>(
    input: R,
    mapping: &ColumnMapping,
) -> TableResult<Vec<BundleNameRow>> {
    let cols = &mapping.bundle_names;
    let mut reader = csv_reader(input, mapping)?;
    let headers = Headers::new("bundle_names", reader.headers()?);

    let bundle_id = headers.require(&cols.bundle_id)?;
    let display_name = headers.require(&cols.display_name)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(BundleNameRow {
            bundle_id: field(&record, Some(bundle_id)).unwrap_or_default(),
            display_name: field(&record, Some(display_name)).unwrap_or_default(),
        });
    }
    Ok(rows)
}

/// Loads `pacotes.csv`, `cid.csv` and `oci_nome.csv` from `dir`.
pub fn load_catalog_dir(dir: &Path, mapping: &ColumnMapping) -> TableResult<Catalogs> {
    let catalogs = Catalogs {
        rules: read_rules(open(&dir.join(RULES_FILE_NAME))?, mapping)?,
        diagnoses: read_diagnoses(open(&dir.join(DIAGNOSES_FILE_NAME))?, mapping)?,
        bundle_names: read_bundle_names(open(&dir.join(BUNDLE_NAMES_FILE_NAME))?, mapping)?,
    };
    tracing::info!(
        "loaded catalogues from {}: {} rule rows, {} diagnosis rows, {} names",
        dir.display(),
        catalogs.rules.len(),
        catalogs.diagnoses.len(),
        catalogs.bundle_names.len()
    );
    Ok(catalogs)
}
