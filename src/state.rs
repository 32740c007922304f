//! Shared timing aggregate fed by every proxy
//!
//! Maps `(target type, operation)` to the cumulative time spent in that
//! operation. Entries are created on first record and only ever grow; there
//! is no reset. One `ProfilingState` is typically shared through an `Arc` by
//! all proxies of a profiling run.

use crate::operation::OperationId;
use crate::report::format_duration;
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

/// Aggregation key: concrete target type name plus operation identity
///
/// Field order gives the export order: type name, operation name, signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallKey {
    pub target_type: &'static str,
    pub operation: OperationId,
}

/// Accumulated statistics for a single key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    /// Number of measured calls
    pub calls: u64,
    /// Total elapsed time across all measured calls
    pub elapsed: Duration,
}

/// One row of an export, in deterministic order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileEntry {
    pub target_type: &'static str,
    pub operation: &'static str,
    pub signature: &'static str,
    pub calls: u64,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl ProfileEntry {
    /// Report line in the `Type#operation took XmYsZms` format
    pub fn to_line(&self) -> String {
        format!(
            "{}#{} took {}",
            self.target_type,
            self.operation,
            format_duration(self.elapsed)
        )
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_nanos() as f64 / 1_000_000.0)
}

/// Concurrency-safe accumulation of elapsed time per `(type, operation)`
///
/// Updates are a read-modify-write under a single mutex, so concurrent
/// records against the same key are never lost. The map is ordered, which
/// makes [`ProfilingState::export`] independent of insertion order.
#[derive(Debug, Default)]
pub struct ProfilingState {
    data: Mutex<BTreeMap<CallKey, CallStats>>,
}

impl ProfilingState {
    /// Create an empty aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `elapsed` to the cumulative time for `(target_type, operation)`
    pub fn record(&self, target_type: &'static str, operation: OperationId, elapsed: Duration) {
        let key = CallKey {
            target_type,
            operation,
        };
        let mut data = self.data.lock();
        let entry = data.entry(key).or_default();
        entry.calls += 1;
        entry.elapsed += elapsed;
    }

    /// Cumulative time recorded for a key, if any call was recorded
    pub fn elapsed(&self, target_type: &str, operation: &str) -> Option<Duration> {
        self.stats(target_type, operation).map(|stats| stats.elapsed)
    }

    /// Accumulated statistics for a key, summed over operation signatures
    pub fn stats(&self, target_type: &str, operation: &str) -> Option<CallStats> {
        let data = self.data.lock();
        data.iter()
            .filter(|(key, _)| key.target_type == target_type && key.operation.name == operation)
            .map(|(_, stats)| *stats)
            .reduce(|acc, stats| CallStats {
                calls: acc.calls + stats.calls,
                elapsed: acc.elapsed + stats.elapsed,
            })
    }

    /// Number of distinct keys recorded so far
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// Snapshot of every key and its cumulative value
    ///
    /// Ordered by type name, then operation name, then signature.
    pub fn export(&self) -> Vec<ProfileEntry> {
        let data = self.data.lock();
        data.iter()
            .map(|(key, stats)| ProfileEntry {
                target_type: key.target_type,
                operation: key.operation.name,
                signature: key.operation.signature,
                calls: stats.calls,
                elapsed: stats.elapsed,
            })
            .collect()
    }

    /// Write one `Type#operation took XmYsZms` line per key, in export order
    pub fn write_text<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        for entry in self.export() {
            writeln!(writer, "{}", entry.to_line())?;
        }
        Ok(())
    }
}
