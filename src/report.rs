//! Report rendering for the timing aggregate
//!
//! Text reports start with a `Run at` header carrying the profiler's creation
//! time in RFC 1123 form, followed by one line per recorded key and a blank
//! line, so that several runs can be appended to the same file.

use crate::error::ReportError;
use crate::state::{ProfileEntry, ProfilingState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;

/// Output format for profiling reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable text format (default)
    #[default]
    Text,
    /// JSON document for machine parsing
    Json,
}

/// Format a duration as `{minutes}m {seconds}s {millis}ms`
///
/// ```
/// use calltime::report::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(200)), "0m 0s 200ms");
/// assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s 0ms");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!(
        "{}m {}s {}ms",
        secs / 60,
        secs % 60,
        duration.subsec_millis()
    )
}

/// RFC 1123 rendering used in the `Run at` header
pub fn format_run_at(start_time: &DateTime<Utc>) -> String {
    start_time.format("%a, %-d %b %Y %H:%M:%S GMT").to_string()
}

/// JSON report document
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub run_at: String,
    pub entries: Vec<ProfileEntry>,
}

/// Write a report for `state` in the requested format
pub fn write_report<W: Write + ?Sized>(
    writer: &mut W,
    state: &ProfilingState,
    start_time: &DateTime<Utc>,
    format: ReportFormat,
) -> Result<(), ReportError> {
    match format {
        ReportFormat::Text => {
            writeln!(writer, "Run at {}", format_run_at(start_time))?;
            state.write_text(writer)?;
            writeln!(writer)?;
        }
        ReportFormat::Json => {
            let report = JsonReport {
                run_at: start_time.to_rfc3339(),
                entries: state.export(),
            };
            serde_json::to_writer_pretty(&mut *writer, &report)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
