//! Constants used throughout the OCI core crate.
//!
//! Defaults for [`crate::CoreConfig`] and the fixed labels of the output table.

/// Procedure-code prefixes whose effective code carries the executing specialty.
pub const DEFAULT_SPECIALTY_GROUP_PREFIXES: &[&str] = &["03", "04"];

/// Delimiter between a procedure code and the executing specialty code.
pub const DEFAULT_SPECIALTY_DELIMITER: &str = "|";

/// Procedure-code prefixes that close a bundle instance's workflow when executed last.
pub const DEFAULT_TERMINAL_PROCEDURE_PREFIXES: &[&str] = &["0301010"];

/// Compatibility type of a required rule row.
pub const COMPATIBILITY_REQUIRED: i64 = 5;

/// Compatibility type of an optional rule row.
pub const COMPATIBILITY_OPTIONAL: i64 = 1;

/// Accepted textual date layouts, tried in order after RFC 3339.
/// `%.f` also accepts a missing fraction.
pub const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Accepted date-only layouts.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
