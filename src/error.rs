//! Error types
//!
//! A target's own failures never appear here: they travel through the proxy
//! as part of the target's return value and reach the caller untouched.

use thiserror::Error;

/// Errors raised while building a proxy, before any call can happen
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("interface {interface} declares operation {operation} more than once")]
    DuplicateOperation {
        interface: &'static str,
        operation: &'static str,
    },

    #[error("interface {interface} has no profiled operations")]
    NoProfiledOperations { interface: &'static str },
}

/// Failures of the interception mechanism itself
///
/// These indicate a construction or environment defect, never an outcome of
/// the timed operation, and carry no elapsed-time record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterceptError {
    #[error("operation {operation} is not registered on interface {interface}")]
    UnknownOperation {
        interface: &'static str,
        operation: String,
    },
}

/// Errors that can occur while writing a profiling report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading profiler configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profiler config: {0}")]
    Parse(#[from] toml::de::Error),
}
