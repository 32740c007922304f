//! Profiler configuration
//!
//! Loaded from TOML, e.g.:
//!
//! ```toml
//! output_path = "profile.txt"
//! format = "text"
//! require_profiled_operations = true
//! ```

use crate::error::ConfigError;
use crate::report::ReportFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a [`Profiler`](crate::Profiler)
///
/// # Example
/// ```
/// use calltime::config::ProfilerConfig;
///
/// let config = ProfilerConfig::default();
/// assert!(config.output_path.is_none());
/// assert!(!config.require_profiled_operations);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilerConfig {
    /// File the report is appended to; standard output when unset
    pub output_path: Option<PathBuf>,

    /// Report format
    pub format: ReportFormat,

    /// Reject interfaces that declare no profiled operation
    ///
    /// Wrapping such an interface can never produce a measurement, which
    /// usually means the marker was forgotten.
    pub require_profiled_operations: bool,
}

impl ProfilerConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Set the report output path
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the report format
    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    /// Reject interfaces without profiled operations
    pub fn strict(mut self) -> Self {
        self.require_profiled_operations = true;
        self
    }
}
