//! CSV boundary for the OCI identification pipeline.
//!
//! This crate provides **table readers and writers** around `oci-core`:
//! - requisition and catalogue CSV files → core input rows
//! - annotated rows → output CSV
//!
//! It owns the column-name mapping and the required-column precondition. All bundle logic
//! stays in `oci-core`.

pub mod columns;
pub mod reader;
pub mod writer;

pub use columns::ColumnMapping;
pub use reader::{
    load_catalog_dir, read_bundle_names, read_diagnoses, read_requisitions,
    read_requisitions_path, read_rules, Catalogs, RequisitionTable,
};
pub use writer::write_annotated;

/// Errors returned by the `oci-tables` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("required column {column:?} missing from {table} table")]
    MissingColumn { table: &'static str, column: String },

    #[error("failed to open {path}: {source}", path = path.display())]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid column mapping YAML: {0}")]
    Mapping(serde_yaml::Error),

    #[error("delimiter {0:?} is not a single-byte character")]
    InvalidDelimiter(char),
}

/// Type alias for Results that can fail with a [`TableError`].
pub type TableResult<T> = Result<T, TableError>;
