//! Versioned document boundary.
//!
//! Only the current version is accepted; upgrading older documents is the
//! job of whoever hands the file to us.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sheet::Sheet;

pub const CURRENT_VERSION: &str = "1.1";

#[derive(Debug, Error)]
pub enum FileError {
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported document version {found:?} (expected {})", CURRENT_VERSION)]
    UnsupportedVersion { found: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridFile {
    pub version: String,
    pub sheets: Vec<Sheet>,
}

impl GridFile {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { version: CURRENT_VERSION.to_string(), sheets }
    }

    pub fn to_json(&self) -> Result<String, FileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, FileError> {
        let file: GridFile = serde_json::from_str(json)?;
        if file.version != CURRENT_VERSION {
            return Err(FileError::UnsupportedVersion { found: file.version });
        }
        Ok(file)
    }
}
