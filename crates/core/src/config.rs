//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into [`crate::OciService`]. Binaries decide where settings come from (a YAML file,
//! environment variables); the pipeline itself never reads process-wide state.

use crate::constants::{
    DEFAULT_SPECIALTY_DELIMITER, DEFAULT_SPECIALTY_GROUP_PREFIXES,
    DEFAULT_TERMINAL_PROCEDURE_PREFIXES,
};
use crate::{OciError, OciResult};
use serde::Deserialize;
use std::path::Path;

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    specialty_group_prefixes: Vec<String>,
    specialty_delimiter: String,
    terminal_procedure_prefixes: Vec<String>,
    close_empty_bundles: bool,
    keep_unmatched: bool,
    summarize: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `OciError::InvalidInput` if the delimiter is empty or any prefix is blank.
    pub fn new(
        specialty_group_prefixes: Vec<String>,
        specialty_delimiter: String,
        terminal_procedure_prefixes: Vec<String>,
        close_empty_bundles: bool,
        keep_unmatched: bool,
        summarize: bool,
    ) -> OciResult<Self> {
        if specialty_delimiter.is_empty() {
            return Err(OciError::InvalidInput(
                "specialty_delimiter cannot be empty".into(),
            ));
        }

        let blank = |prefixes: &[String]| prefixes.iter().any(|p| p.trim().is_empty());
        if blank(&specialty_group_prefixes) {
            return Err(OciError::InvalidInput(
                "specialty_group_prefixes cannot contain blank entries".into(),
            ));
        }
        if blank(&terminal_procedure_prefixes) {
            return Err(OciError::InvalidInput(
                "terminal_procedure_prefixes cannot contain blank entries".into(),
            ));
        }

        Ok(Self {
            specialty_group_prefixes,
            specialty_delimiter,
            terminal_procedure_prefixes,
            close_empty_bundles,
            keep_unmatched,
            summarize,
        })
    }

    /// Parse settings from YAML text. Every key is optional and falls back to its default.
    pub fn from_yaml_str(yaml_text: &str) -> OciResult<Self> {
        let settings: SettingsWire =
            serde_yaml::from_str(yaml_text).map_err(OciError::ConfigParse)?;
        Self::new(
            settings.specialty_group_prefixes,
            settings.specialty_delimiter,
            settings.terminal_procedure_prefixes,
            settings.close_empty_bundles,
            settings.keep_unmatched,
            settings.summarize,
        )
    }

    /// Read and parse a YAML settings file.
    pub fn from_yaml_file(path: &Path) -> OciResult<Self> {
        let text = std::fs::read_to_string(path).map_err(OciError::ConfigRead)?;
        Self::from_yaml_str(&text)
    }

    pub fn specialty_group_prefixes(&self) -> &[String] {
        &self.specialty_group_prefixes
    }

    pub fn specialty_delimiter(&self) -> &str {
        &self.specialty_delimiter
    }

    pub fn terminal_procedure_prefixes(&self) -> &[String] {
        &self.terminal_procedure_prefixes
    }

    /// Whether a bundle with no required codes and no alternative groups closes for everyone.
    ///
    /// Defaults to `false`. The source pipeline closed such bundles by vacuous truth; set this to
    /// restore that behaviour.
    pub fn close_empty_bundles(&self) -> bool {
        self.close_empty_bundles
    }

    /// Whether rows outside every closed bundle are kept in the pipeline output.
    pub fn keep_unmatched(&self) -> bool {
        self.keep_unmatched
    }

    pub fn summarize(&self) -> bool {
        self.summarize
    }

    /// Returns a copy with `keep_unmatched` replaced.
    pub fn with_keep_unmatched(mut self, keep_unmatched: bool) -> Self {
        self.keep_unmatched = keep_unmatched;
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        let settings = SettingsWire::default();
        Self {
            specialty_group_prefixes: settings.specialty_group_prefixes,
            specialty_delimiter: settings.specialty_delimiter,
            terminal_procedure_prefixes: settings.terminal_procedure_prefixes,
            close_empty_bundles: settings.close_empty_bundles,
            keep_unmatched: settings.keep_unmatched,
            summarize: settings.summarize,
        }
    }
}

/// On-disk settings document.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsWire {
    specialty_group_prefixes: Vec<String>,
    specialty_delimiter: String,
    terminal_procedure_prefixes: Vec<String>,
    close_empty_bundles: bool,
    keep_unmatched: bool,
    summarize: bool,
}

impl Default for SettingsWire {
    fn default() -> Self {
        let owned = |values: &[&str]| -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        };
        Self {
            specialty_group_prefixes: owned(DEFAULT_SPECIALTY_GROUP_PREFIXES),
            specialty_delimiter: DEFAULT_SPECIALTY_DELIMITER.to_string(),
            terminal_procedure_prefixes: owned(DEFAULT_TERMINAL_PROCEDURE_PREFIXES),
            close_empty_bundles: false,
            keep_unmatched: false,
            summarize: true,
        }
    }
}
