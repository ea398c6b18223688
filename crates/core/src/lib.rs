//! # OCI Core
//!
//! Core business logic for identifying bundled procedure groups (OCIs) in requisition records.
//!
//! The pipeline, leaf first:
//! - [`rules`]: compiles the bundle-composition catalogue into per-bundle rules
//! - [`patient_index`]: groups requisitions into per-patient procedure sets
//! - [`matcher`]: decides, for every patient and bundle, whether the bundle closes
//! - [`annotate`]: projects closed bundles back onto requisition rows
//! - [`summary`]: derives a tier and workflow status per bundle instance
//!
//! [`OciService`] runs them in order for one batch.
//!
//! **No I/O concerns**: reading and writing tables belongs in `oci-tables`; process
//! configuration and logging setup belong in the binaries.

pub mod annotate;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod matcher;
pub mod patient_index;
pub mod period;
pub mod requisition;
pub mod rules;
pub mod service;
pub mod summary;

pub use annotate::{annotate, Action, AnnotatedRow};
pub use catalog::{BundleNameCatalog, BundleNameRow, DiagnosisCatalog, DiagnosisRow};
pub use config::CoreConfig;
pub use error::{OciError, OciResult};
pub use matcher::{match_bundles, BundleMatch, MatchResults};
pub use patient_index::{index_patients, PatientIndex};
pub use period::{available_periods, filter_by_period, BillingPeriod};
pub use requisition::{ingest, RawRequisition, Requisition};
pub use rules::{compile_rules, BundleRule, RuleRow, RuleTable};
pub use service::{OciService, PipelineInput};
pub use summary::{summarize, QualificationTier, WorkflowStatus};

pub use oci_types::{BundleId, BundleInstanceKey, PatientId, ProcedureCode};
