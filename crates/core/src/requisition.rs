//! Requisition rows and their one-time validation.
//!
//! The boundary hands over [`RawRequisition`]s holding optional text exactly as read. They are
//! validated once into typed [`Requisition`]s: identifiers are checked, dates parsed and the
//! effective match code derived. Later stages never look at raw text again.

use crate::constants::{DATE_FORMATS, DATE_TIME_FORMATS};
use crate::CoreConfig;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use oci_types::{PatientId, ProcedureCode};

/// A requisition row as supplied by the caller, before validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRequisition {
    pub record_id: Option<String>,
    pub patient_id: Option<String>,
    pub procedure_code: Option<String>,
    pub requested_at: Option<String>,
    pub executed_at: Option<String>,
    pub specialty_code: Option<String>,
    pub diagnosis_code: Option<String>,
    /// Columns the pipeline does not interpret, in source order.
    pub extra_columns: Vec<(String, String)>,
}

/// A validated requisition row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requisition {
    pub record_id: String,
    pub patient_id: PatientId,
    /// The procedure code as requested.
    pub procedure_code: ProcedureCode,
    /// The code used for bundle matching; carries the specialty suffix for specialty groups.
    pub match_code: ProcedureCode,
    pub requested_at: Option<NaiveDateTime>,
    pub executed_at: Option<NaiveDateTime>,
    pub specialty_code: Option<String>,
    pub diagnosis_code: Option<String>,
    pub extra_columns: Vec<(String, String)>,
}

impl Requisition {
    pub fn is_executed(&self) -> bool {
        self.executed_at.is_some()
    }
}

/// Validates raw rows into [`Requisition`]s.
///
/// Rows with a blank record id, patient id or procedure code cannot take part in matching and
/// are dropped with a warning. Unparseable dates become `None`; diagnosis codes are upper-cased.
pub fn ingest(rows: Vec<RawRequisition>, cfg: &CoreConfig) -> Vec<Requisition> {
    let total = rows.len();
    let mut out = Vec::with_capacity(total);

    for (idx, raw) in rows.into_iter().enumerate() {
        let Some(record_id) = non_blank(raw.record_id.as_deref()) else {
            tracing::warn!("dropping requisition row {}: missing record id", idx + 1);
            continue;
        };
        let Ok(patient_id) = PatientId::new(raw.patient_id.as_deref().unwrap_or_default()) else {
            tracing::warn!("dropping requisition {record_id}: missing patient id");
            continue;
        };
        let code = raw.procedure_code.as_deref().unwrap_or_default();
        let Ok(procedure_code) = ProcedureCode::new(code) else {
            tracing::warn!("dropping requisition {record_id}: missing procedure code");
            continue;
        };

        let specialty_code = non_blank(raw.specialty_code.as_deref());
        let match_code = effective_code(&procedure_code, specialty_code.as_deref(), cfg);

        out.push(Requisition {
            requested_at: parse_optional_date(raw.requested_at.as_deref(), &record_id),
            executed_at: parse_optional_date(raw.executed_at.as_deref(), &record_id),
            record_id,
            patient_id,
            procedure_code,
            match_code,
            specialty_code,
            diagnosis_code: non_blank(raw.diagnosis_code.as_deref()).map(|c| c.to_uppercase()),
            extra_columns: raw.extra_columns,
        });
    }

    if out.len() < total {
        tracing::warn!("{} of {} requisition rows dropped", total - out.len(), total);
    }
    out
}

/// Derives the code a requisition is matched under.
///
/// Procedures in the configured specialty groups are matched per executing specialty, so the
/// specialty code is appended with the configured delimiter. Other codes pass through.
pub fn effective_code(
    code: &ProcedureCode,
    specialty_code: Option<&str>,
    cfg: &CoreConfig,
) -> ProcedureCode {
    let in_group = cfg
        .specialty_group_prefixes()
        .iter()
        .any(|prefix| code.as_str().starts_with(prefix.as_str()));

    match specialty_code.map(str::trim).filter(|s| !s.is_empty()) {
        Some(specialty) if in_group => {
            let joined = format!("{}{}{}", code, cfg.specialty_delimiter(), specialty);
            ProcedureCode::new(joined).unwrap_or_else(|_| code.clone())
        }
        _ => code.clone(),
    }
}

/// Parses a date or timestamp in any accepted layout.
///
/// Returns `None` for text that matches none of them. Date-only values become midnight.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn parse_optional_date(value: Option<&str>, record_id: &str) -> Option<NaiveDateTime> {
    let value = value?;
    let parsed = parse_date(value);
    if parsed.is_none() && !value.trim().is_empty() {
        tracing::debug!("requisition {record_id}: unparseable date {value:?} treated as missing");
    }
    parsed
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
