//! Settings file loading and validation for the pst-toolchain.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pst_toolchain_diagnostics::{Severity, is_known_code};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or validating a settings file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// JSON deserialization failed.
    #[error("invalid settings JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is not acceptable.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Dotted path of the field that failed validation.
        field: String,
        /// A human-readable explanation of why the value is invalid.
        reason: String,
    },

    /// The settings file could not be read.
    #[error("cannot read settings file {}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Toolchain settings, usually read from `pst.json`.
///
/// Every field is optional; command-line flags take precedence.
///
/// # Example
/// ```
/// let settings = pst_toolchain_config::load_settings_from_str(
///     r#"{ "descriptions": "docs/pest_fields.csv", "severity": { "PST1101": "info" } }"#,
/// )
/// .unwrap();
/// assert_eq!(settings.severity.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory that relative paths in checker output resolve against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
    /// Field-description table for `pst describe`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<PathBuf>,
    /// Grammar table replacing the built-in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar: Option<PathBuf>,
    /// Diagnostic code to severity, replacing the catalogued default.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub severity: BTreeMap<String, Severity>,
    /// Options for reading checker output.
    #[serde(default)]
    pub checker: CheckerSettings,
}

/// Options for reading checker output.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CheckerSettings {
    /// Drop warnings from reports, as PESTCHEK's `/s` switch does.
    #[serde(default)]
    pub skip_warnings: bool,
}

impl Settings {
    /// Resolve relative paths against `base` (the settings file's directory).
    pub fn rebase(mut self, base: &Path) -> Self {
        for path in [&mut self.workspace_root, &mut self.descriptions, &mut self.grammar]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

/// Load and validate settings from a JSON string.
///
/// Performs structural validation after deserialization:
/// - path fields, when present, must be non-empty
/// - every `severity` key must be a catalogued diagnostic code
pub fn load_settings_from_str(s: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = serde_json::from_str(s)?;

    for (field, path) in [
        ("workspace_root", &settings.workspace_root),
        ("descriptions", &settings.descriptions),
        ("grammar", &settings.grammar),
    ] {
        if let Some(path) = path
            && path.as_os_str().is_empty()
        {
            return Err(ConfigError::InvalidField {
                field: field.into(),
                reason: "must not be empty".into(),
            });
        }
    }

    if let Some(code) = settings.severity.keys().find(|code| !is_known_code(code)) {
        return Err(ConfigError::InvalidField {
            field: format!("severity.{code}"),
            reason: "unknown diagnostic code".into(),
        });
    }

    Ok(settings)
}

/// Read settings from `path`, resolving relative paths against its directory.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = load_settings_from_str(&text)?;
    log::debug!("loaded settings from {}", path.display());
    Ok(match path.parent() {
        Some(dir) => settings.rebase(dir),
        None => settings,
    })
}
