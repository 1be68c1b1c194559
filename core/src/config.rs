//! Loading command declarations from disk.
//!
//! A declaration file is YAML (or JSON, which YAML parses too):
//!
//! ```yaml
//! name: cp
//! spec: "[-r] SRC... DST"
//! options:
//!   - names: ["-r", "--recursive"]
//!     value_type: bool
//! args:
//!   - name: SRC
//!     value_type: strings
//!   - name: DST
//! ```

use std::io::BufReader;
use std::path::Path;

use thiserror::Error;

use crate::types::CommandDecl;

/// Errors that can occur while loading a declaration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CommandDecl {
    /// Loads a declaration from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be read, or
    /// [`ConfigError::YamlError`] if it does not describe a command.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let decl = serde_yaml::from_reader(reader)?;
        Ok(decl)
    }

    /// Parses a declaration from YAML text.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Parses a declaration from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}
