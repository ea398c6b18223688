//! CSV writer for annotated rows.
//!
//! The output repeats the requisition columns in their source order, then appends the
//! annotation columns. The header is written even when there are no rows, so an empty result
//! still carries the full schema.

use crate::columns::ColumnMapping;
use crate::TableResult;
use chrono::{NaiveDateTime, Timelike};
use oci_core::{AnnotatedRow, Requisition};
use std::io::Write;

/// Annotation columns always appended.
pub const ANNOTATION_COLUMNS: &[&str] = &[
    "bundle_id",
    "in_bundle",
    "cid_compativel",
    "display_name",
    "bundle_instance_id",
    "action",
];

/// Columns appended when bundle instances were summarized.
pub const SUMMARY_COLUMNS: &[&str] = &["tier", "status"];

/// Writes annotated rows as CSV.
///
/// `headers` is the requisition header order as read; `summarized` adds the tier and status
/// columns.
pub fn write_annotated<W: Write>(
    output: W,
    headers: &[String],
    rows: &[AnnotatedRow],
    mapping: &ColumnMapping,
    summarized: bool,
) -> TableResult<()> {
    let delimiter = u8::try_from(mapping.delimiter)
        .map_err(|_| crate::TableError::InvalidDelimiter(mapping.delimiter))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(output);

    let mut header_row: Vec<&str> = headers.iter().map(String::as_str).collect();
    header_row.extend_from_slice(ANNOTATION_COLUMNS);
    if summarized {
        header_row.extend_from_slice(SUMMARY_COLUMNS);
    }
    writer.write_record(&header_row)?;

    for row in rows {
        let mut record: Vec<String> = headers
            .iter()
            .map(|h| source_value(&row.requisition, h, mapping))
            .collect();

        record.push(row.bundle_id.as_ref().map(ToString::to_string).unwrap_or_default());
        record.push(row.in_bundle.to_string());
        record.push(row.diagnosis_compatible.to_string());
        record.push(row.display_name.clone().unwrap_or_default());
        record.push(row.instance.as_ref().map(ToString::to_string).unwrap_or_default());
        record.push(row.action.map(|a| a.as_str().to_string()).unwrap_or_default());
        if summarized {
            record.push(row.tier.map(|t| t.as_str().to_string()).unwrap_or_default());
            record.push(row.status.map(|s| s.as_str().to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    tracing::info!("wrote {} annotated rows", rows.len());
    Ok(())
}

fn source_value(requisition: &Requisition, header: &str, mapping: &ColumnMapping) -> String {
    let cols = &mapping.requisitions;
    if header == cols.record_id {
        requisition.record_id.clone()
    } else if header == cols.patient_id {
        requisition.patient_id.to_string()
    } else if header == cols.procedure_code {
        requisition.procedure_code.to_string()
    } else if header == cols.requested_at {
        requisition.requested_at.map(format_date).unwrap_or_default()
    } else if header == cols.executed_at {
        requisition.executed_at.map(format_date).unwrap_or_default()
    } else if header == cols.specialty_code {
        requisition.specialty_code.clone().unwrap_or_default()
    } else if header == cols.diagnosis_code {
        requisition.diagnosis_code.clone().unwrap_or_default()
    } else {
        requisition
            .extra_columns
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }
}

/// Date-only values are written without a time of day.
fn format_date(value: NaiveDateTime) -> String {
    if value.num_seconds_from_midnight() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
