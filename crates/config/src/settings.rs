// Controller settings
// Loaded from ~/.config/tabula/controller.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default number of undo steps kept
pub const DEFAULT_MAX_HISTORY: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Fail loudly on transaction protocol violations instead of recovering
    #[serde(rename = "strict")]
    pub strict: bool,

    /// Undo/redo depth; 0 keeps everything
    #[serde(rename = "maxHistory")]
    pub max_history: usize,

    /// Log every executed statement at debug level
    #[serde(rename = "logStatements")]
    pub log_statements: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            // Debug and test builds are strict, release builds self-heal
            strict: cfg!(debug_assertions),
            max_history: DEFAULT_MAX_HISTORY,
            log_statements: false,
        }
    }
}

impl ControllerSettings {
    /// Settings with strict protocol checks, whatever the build profile
    pub fn strict() -> Self {
        Self { strict: true, ..Self::default() }
    }

    /// Settings that recover from protocol violations
    pub fn lenient() -> Self {
        Self { strict: false, ..Self::default() }
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabula")
            .join("controller.json")
    }

    /// Load settings from the default path, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default controller settings", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parse settings JSON. Lines starting with `//` are treated as comments.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(serde_json::from_str(&cleaned)?)
    }

    /// Save current settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io { path: path.to_path_buf(), source };

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)
    }

    /// History bound as an option; `None` means unbounded
    pub fn history_limit(&self) -> Option<usize> {
        (self.max_history > 0).then_some(self.max_history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ControllerSettings::default();
        assert_eq!(settings.strict, cfg!(debug_assertions));
        assert_eq!(settings.max_history, DEFAULT_MAX_HISTORY);
        assert!(!settings.log_statements);
        assert_eq!(settings.history_limit(), Some(DEFAULT_MAX_HISTORY));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = ControllerSettings::from_json(
            r#"
            // production profile
            { "strict": false, "maxHistory": 0 }
            "#,
        )
        .unwrap();
        assert!(!settings.strict);
        assert_eq!(settings.history_limit(), None);
        assert!(!settings.log_statements);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = ControllerSettings::from_json("{ strict: yes }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("controller.json");

        let settings = ControllerSettings::lenient().with_max_history(7);
        settings.save_to(&path).unwrap();

        let loaded = ControllerSettings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ControllerSettings::load_from(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
