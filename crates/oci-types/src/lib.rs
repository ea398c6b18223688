/// Errors that can occur when creating validated identifier types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// The input was empty or contained only whitespace
    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// Declares a trimmed, non-empty string identifier.
///
/// Every identifier is trimmed of leading and trailing whitespace during construction and
/// rejected when nothing is left. Ordering is plain string ordering so maps keyed by these
/// types iterate deterministically.
macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the given input.
            ///
            /// Returns `Err(IdError::Empty)` if the trimmed input is empty.
            pub fn new(input: impl AsRef<str>) -> Result<Self, IdError> {
                let trimmed = input.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(IdError::Empty($label));
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the inner string as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $name::new(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

identifier!(
    /// Identifier of a patient, shared by every requisition row of that patient.
    PatientId,
    "patient id"
);

identifier!(
    /// Bundle (OCI) identifier, the `CO_OCI` column of the rule catalogue.
    BundleId,
    "bundle id"
);

identifier!(
    /// A procedure code as matched against bundle rules.
    ///
    /// For specialty-sensitive procedure groups this is the effective code, i.e. the base
    /// code joined with the executing professional's specialty code.
    ProcedureCode,
    "procedure code"
);

/// Composite key of one bundle instance: one patient paired with one closed bundle.
///
/// Displayed as `patient_id|bundle_id` for reporting only; code never parses the display
/// form back apart.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct BundleInstanceKey {
    pub patient_id: PatientId,
    pub bundle_id: BundleId,
}

impl BundleInstanceKey {
    pub fn new(patient_id: PatientId, bundle_id: BundleId) -> Self {
        Self {
            patient_id,
            bundle_id,
        }
    }
}

impl std::fmt::Display for BundleInstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.patient_id, self.bundle_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_trimmed() {
        let id = PatientId::new("  P1 \t").expect("valid id");
        assert_eq!(id.as_str(), "P1");
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        let err = BundleId::new("   ").expect_err("blank id should fail");
        assert_eq!(err, IdError::Empty("bundle id"));
        assert_eq!(err.to_string(), "bundle id cannot be empty");
    }

    #[test]
    fn instance_key_displays_with_pipe() {
        let key = BundleInstanceKey::new(
            PatientId::new("P1").expect("valid id"),
            BundleId::new("100").expect("valid id"),
        );
        assert_eq!(key.to_string(), "P1|100");
    }

    #[test]
    fn instance_keys_order_by_patient_then_bundle() {
        let key = |p: &str, b: &str| {
            BundleInstanceKey::new(
                PatientId::new(p).expect("valid id"),
                BundleId::new(b).expect("valid id"),
            )
        };
        let mut keys = vec![key("P2", "100"), key("P1", "200"), key("P1", "100")];
        keys.sort();
        assert_eq!(keys, vec![key("P1", "100"), key("P1", "200"), key("P2", "100")]);
    }

    #[test]
    fn deserialize_rejects_blank_codes() {
        let err = serde_json::from_str::<ProcedureCode>("\"  \"").expect_err("blank code");
        assert!(err.to_string().contains("procedure code cannot be empty"));
    }
}
