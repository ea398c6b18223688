//! Rule compiler.
//!
//! Turns the flat bundle-composition catalogue into one [`BundleRule`] per bundle. Each catalogue
//! row is classified by its compatibility type:
//! - type 5 without an alternative-group tag: required, all must be present
//! - type 5 with a tag: member of that tag's alternative group, one per group must be present
//! - type 1: optional, recorded when present but never gates closure
//!
//! Rows of any other type are dropped without error.

use crate::constants::{COMPATIBILITY_OPTIONAL, COMPATIBILITY_REQUIRED};
use oci_types::{BundleId, ProcedureCode};
use std::collections::BTreeMap;

/// One row of the bundle-composition catalogue, as supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleRow {
    pub bundle_id: String,
    pub procedure_code: String,
    pub compatibility_type: String,
    pub alternative_group: Option<String>,
}

/// Parsed compatibility value: numeric when the text is an integer, otherwise the literal text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompatibilityType {
    Numeric(i64),
    Literal(String),
}

impl CompatibilityType {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Literal(trimmed.to_string()),
        }
    }

    fn is(&self, code: i64) -> bool {
        match self {
            Self::Numeric(n) => *n == code,
            Self::Literal(s) => *s == code.to_string(),
        }
    }

    pub fn is_required(&self) -> bool {
        self.is(COMPATIBILITY_REQUIRED)
    }

    pub fn is_optional(&self) -> bool {
        self.is(COMPATIBILITY_OPTIONAL)
    }
}

/// Set of mutually substitutable procedures; any one of them satisfies the group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlternativeGroup {
    pub tag: String,
    /// Codes in catalogue order.
    pub codes: Vec<ProcedureCode>,
}

/// Composition rule of a single bundle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BundleRule {
    pub required: Vec<ProcedureCode>,
    /// Groups in order of first-seen tag.
    pub alternative_groups: Vec<AlternativeGroup>,
    pub optional: Vec<ProcedureCode>,
}

impl BundleRule {
    /// True when nothing gates closure: no required codes and no alternative groups.
    pub fn has_no_closing_criteria(&self) -> bool {
        self.required.is_empty() && self.alternative_groups.is_empty()
    }

    fn push_unique(codes: &mut Vec<ProcedureCode>, code: ProcedureCode) {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }

    fn add_alternative(&mut self, tag: &str, code: ProcedureCode) {
        match self.alternative_groups.iter_mut().find(|g| g.tag == tag) {
            Some(group) => Self::push_unique(&mut group.codes, code),
            None => self.alternative_groups.push(AlternativeGroup {
                tag: tag.to_string(),
                codes: vec![code],
            }),
        }
    }
}

/// All compiled bundle rules, keyed by bundle id.
pub type RuleTable = BTreeMap<BundleId, BundleRule>;

/// Compiles catalogue rows into a [`RuleTable`].
///
/// Alternative-group tags are scoped per bundle, so two bundles may both use tag `A`.
/// Malformed rows (blank bundle id or procedure code) are skipped like unknown types.
pub fn compile_rules(rows: &[RuleRow]) -> RuleTable {
    let mut table = RuleTable::new();
    let mut ignored = 0usize;

    for row in rows {
        let (Ok(bundle_id), Ok(code)) = (
            BundleId::new(&row.bundle_id),
            ProcedureCode::new(&row.procedure_code),
        ) else {
            ignored += 1;
            tracing::warn!(
                "ignoring rule row with blank bundle id or procedure code: {:?}/{:?}",
                row.bundle_id,
                row.procedure_code
            );
            continue;
        };
        let compatibility = CompatibilityType::parse(&row.compatibility_type);
        let tag = row
            .alternative_group
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let rule = table.entry(bundle_id).or_default();
        if compatibility.is_required() {
            match tag {
                Some(tag) => rule.add_alternative(tag, code),
                None => BundleRule::push_unique(&mut rule.required, code),
            }
        } else if compatibility.is_optional() {
            BundleRule::push_unique(&mut rule.optional, code);
        } else {
            ignored += 1;
            tracing::debug!(
                "ignoring rule row {}/{}: compatibility type {:?}",
                row.bundle_id.trim(),
                row.procedure_code.trim(),
                compatibility
            );
        }
    }

    for (bundle_id, rule) in &table {
        if rule.has_no_closing_criteria() {
            tracing::warn!("bundle {bundle_id} has no required codes or alternative groups");
        }
    }

    tracing::info!(
        "compiled {} bundle rules from {} rows ({} ignored)",
        table.len(),
        rows.len(),
        ignored
    );
    table
}
