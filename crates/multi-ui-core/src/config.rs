//! Persisted per-project preferences
//!
//! One JSON file (`multi-ui.config.json`) at the project root records the
//! language choice and the directory components are written to. The file is
//! created by `setup` and consulted by every `add` invocation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the preference file, relative to the project root
pub const CONFIG_FILE_NAME: &str = "multi-ui.config.json";

/// Component path substituted when no preference file exists
pub const DEFAULT_COMPONENT_PATH: &str = "src/app/multi-ui/components";

/// Output dialect for copied components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
}

impl Language {
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
        }
    }

    /// File extension for materialized components
    pub fn extension(&self) -> &'static str {
        match self {
            Language::JavaScript => "jsx",
            Language::TypeScript => "tsx",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// The persisted preference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub language: Language,

    /// Directory component files are written under
    pub component_path: PathBuf,
}

impl Default for Preference {
    fn default() -> Self {
        Self {
            language: Language::TypeScript,
            component_path: PathBuf::from(DEFAULT_COMPONENT_PATH),
        }
    }
}

/// Where a loaded preference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceSource {
    /// Parsed from an existing preference file
    File,
    /// No preference file was found; hardcoded defaults substituted
    Default,
}

/// A preference together with its provenance, so callers can surface a
/// warning when defaults were substituted
#[derive(Debug, Clone)]
pub struct LoadedPreference {
    pub preference: Preference,
    pub source: PreferenceSource,
}

/// Errors reading or writing the preference file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed configuration in {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reads and writes the preference file for one project root
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    config_path: PathBuf,
}

impl PreferenceStore {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            config_path: project_dir.join(CONFIG_FILE_NAME),
        }
    }

    /// Path of the preference file (whether or not it exists yet)
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Serialize the preference, overwriting any existing file silently
    pub fn save(&self, preference: &Preference) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(preference).map_err(|source| {
            ConfigError::Malformed {
                path: self.config_path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.config_path, json).map_err(|source| ConfigError::Write {
            path: self.config_path.clone(),
            source,
        })
    }

    /// Load the preference, substituting defaults when the file is absent.
    /// A malformed file is a hard error; a missing one never is.
    pub fn load(&self) -> Result<LoadedPreference, ConfigError> {
        if !self.config_path.exists() {
            return Ok(LoadedPreference {
                preference: Preference::default(),
                source: PreferenceSource::Default,
            });
        }

        let content =
            std::fs::read_to_string(&self.config_path).map_err(|source| ConfigError::Read {
                path: self.config_path.clone(),
                source,
            })?;
        let preference =
            serde_json::from_str(&content).map_err(|source| ConfigError::Malformed {
                path: self.config_path.clone(),
                source,
            })?;

        Ok(LoadedPreference {
            preference,
            source: PreferenceSource::File,
        })
    }
}
