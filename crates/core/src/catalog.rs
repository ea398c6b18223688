//! Reference catalogues consulted while annotating matched rows.

use oci_types::BundleId;
use std::collections::{HashMap, HashSet};

/// One accepted (bundle, diagnosis) pairing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosisRow {
    pub bundle_id: String,
    pub diagnosis_code: String,
}

/// One bundle display name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BundleNameRow {
    pub bundle_id: String,
    pub display_name: String,
}

/// Diagnosis codes accepted per bundle.
///
/// Codes are compared trimmed and upper-cased on both sides.
#[derive(Clone, Debug, Default)]
pub struct DiagnosisCatalog {
    accepted: HashSet<(BundleId, String)>,
}

impl DiagnosisCatalog {
    pub fn from_rows(rows: &[DiagnosisRow]) -> Self {
        let accepted = rows
            .iter()
            .filter_map(|row| {
                let bundle_id = BundleId::new(&row.bundle_id).ok()?;
                let code = normalise_diagnosis(&row.diagnosis_code)?;
                Some((bundle_id, code))
            })
            .collect();
        Self { accepted }
    }

    /// Whether `diagnosis_code` is accepted for `bundle_id`. A missing code is never accepted.
    pub fn is_compatible(&self, bundle_id: &BundleId, diagnosis_code: Option<&str>) -> bool {
        let Some(code) = diagnosis_code.and_then(normalise_diagnosis) else {
            return false;
        };
        self.accepted.contains(&(bundle_id.clone(), code))
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Display names per bundle.
#[derive(Clone, Debug, Default)]
pub struct BundleNameCatalog {
    names: HashMap<BundleId, String>,
}

impl BundleNameCatalog {
    /// Builds the catalogue. When a bundle is listed more than once the first name wins.
    pub fn from_rows(rows: &[BundleNameRow]) -> Self {
        let mut names = HashMap::new();
        for row in rows {
            let Ok(bundle_id) = BundleId::new(&row.bundle_id) else {
                continue;
            };
            let name = row.display_name.trim();
            if !name.is_empty() {
                names.entry(bundle_id).or_insert_with(|| name.to_string());
            }
        }
        Self { names }
    }

    pub fn name(&self, bundle_id: &BundleId) -> Option<&str> {
        self.names.get(bundle_id).map(String::as_str)
    }
}

fn normalise_diagnosis(code: &str) -> Option<String> {
    let code = code.trim();
    (!code.is_empty()).then(|| code.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(id: &str) -> BundleId {
        BundleId::new(id).expect("valid id")
    }

    #[test]
    fn diagnosis_match_is_case_insensitive_and_trimmed() {
        let catalog = DiagnosisCatalog::from_rows(&[DiagnosisRow {
            bundle_id: "100".into(),
            diagnosis_code: " c50 ".into(),
        }]);

        assert!(catalog.is_compatible(&bundle("100"), Some("C50")));
        assert!(catalog.is_compatible(&bundle("100"), Some("  c50")));
        assert!(!catalog.is_compatible(&bundle("200"), Some("C50")));
        assert!(!catalog.is_compatible(&bundle("100"), Some("C501")));
        assert!(!catalog.is_compatible(&bundle("100"), None));
        assert!(!catalog.is_compatible(&bundle("100"), Some("  ")));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let catalog = DiagnosisCatalog::from_rows(&[
            DiagnosisRow {
                bundle_id: " ".into(),
                diagnosis_code: "C50".into(),
            },
            DiagnosisRow {
                bundle_id: "100".into(),
                diagnosis_code: "".into(),
            },
        ]);
        assert!(catalog.is_empty());
    }

    #[test]
    fn first_display_name_wins() {
        let catalog = BundleNameCatalog::from_rows(&[
            BundleNameRow {
                bundle_id: "100".into(),
                display_name: "Breast cancer diagnosis".into(),
            },
            BundleNameRow {
                bundle_id: "100".into(),
                display_name: "Duplicate".into(),
            },
        ]);
        assert_eq!(catalog.name(&bundle("100")), Some("Breast cancer diagnosis"));
        assert_eq!(catalog.name(&bundle("200")), None);
    }
}
