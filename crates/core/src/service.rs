//! OCI identification service.
//!
//! Runs the full pipeline for one batch: ingestion, optional billing-period filter, rule
//! compilation, patient indexing, matching, annotation and summarizing.

use crate::annotate::{annotate, AnnotatedRow};
use crate::catalog::{BundleNameCatalog, BundleNameRow, DiagnosisCatalog, DiagnosisRow};
use crate::matcher::match_bundles;
use crate::patient_index::index_patients;
use crate::period::{filter_by_period, BillingPeriod};
use crate::requisition::{ingest, RawRequisition};
use crate::rules::{compile_rules, RuleRow};
use crate::summary::summarize;
use crate::CoreConfig;
use std::sync::Arc;

/// The two source tables and the two reference catalogues of one run.
#[derive(Clone, Debug, Default)]
pub struct PipelineInput {
    pub requisitions: Vec<RawRequisition>,
    pub rules: Vec<RuleRow>,
    pub diagnoses: Vec<DiagnosisRow>,
    pub bundle_names: Vec<BundleNameRow>,
}

/// Pure bundle identification - no I/O concerns
#[derive(Clone)]
pub struct OciService {
    cfg: Arc<CoreConfig>,
}

impl OciService {
    /// Creates a new instance of OciService.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Identifies bundles in one batch of requisitions.
    ///
    /// Output rows are sorted by patient, bundle and record id. Unless `keep_unmatched` is
    /// configured only rows belonging to a closed bundle are returned; when no bundle closes
    /// the result is empty.
    ///
    /// # Arguments
    ///
    /// * `input` - Requisitions plus the rule, diagnosis and name catalogues.
    /// * `period` - Billing period restricting executed requisitions, if any.
    pub fn process(
        &self,
        input: PipelineInput,
        period: Option<BillingPeriod>,
    ) -> Vec<AnnotatedRow> {
        let mut requisitions = ingest(input.requisitions, &self.cfg);
        if let Some(period) = period {
            requisitions = filter_by_period(requisitions, period);
        }

        let rules = compile_rules(&input.rules);
        let index = index_patients(&requisitions);
        let matches = match_bundles(&index, &rules, self.cfg.close_empty_bundles());

        let diagnoses = DiagnosisCatalog::from_rows(&input.diagnoses);
        let names = BundleNameCatalog::from_rows(&input.bundle_names);
        let mut rows = annotate(&requisitions, &matches, &diagnoses, &names);

        if !self.cfg.keep_unmatched() {
            rows.retain(|r| r.in_bundle);
        }

        // Sort before summarizing: execution-date ties break by row order.
        rows.sort_by(|a, b| {
            (&a.requisition.patient_id, &a.bundle_id, &a.requisition.record_id).cmp(&(
                &b.requisition.patient_id,
                &b.bundle_id,
                &b.requisition.record_id,
            ))
        });
        if self.cfg.summarize() {
            rows = summarize(rows, self.cfg.terminal_procedure_prefixes());
        }

        tracing::info!("identified {} rows", rows.len());
        rows
    }
}
