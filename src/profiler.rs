//! Profiler facade: proxy factory plus report output
//!
//! A `Profiler` owns the clock, the shared [`ProfilingState`] and the run's
//! start time. Every proxy it creates records into the same state, and the
//! accumulated data can be written out as a report at any time.

use crate::clock::Clock;
use crate::config::ProfilerConfig;
use crate::error::{ConstructionError, ReportError};
use crate::interceptor::Proxy;
use crate::operation::Interface;
use crate::report;
use crate::state::ProfilingState;
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Creates timing proxies and writes their accumulated measurements
pub struct Profiler {
    clock: Arc<dyn Clock>,
    state: Arc<ProfilingState>,
    start_time: DateTime<Utc>,
    config: ProfilerConfig,
}

impl Profiler {
    /// Create a profiler with a fresh state and default configuration
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(clock, ProfilerConfig::default())
    }

    /// Create a profiler with a fresh state
    pub fn with_config(clock: Arc<dyn Clock>, config: ProfilerConfig) -> Self {
        Self::with_state(clock, Arc::new(ProfilingState::new()), config)
    }

    /// Create a profiler recording into an existing state
    pub fn with_state(
        clock: Arc<dyn Clock>,
        state: Arc<ProfilingState>,
        config: ProfilerConfig,
    ) -> Self {
        let start_time = clock.now();
        Self {
            clock,
            state,
            start_time,
            config,
        }
    }

    /// Wrap `target` in a proxy for interface `I`
    ///
    /// ```ignore
    /// let crawler = profiler.wrap::<dyn WebCrawler, _>(ParallelCrawler::new())?;
    /// ```
    pub fn wrap<I, T>(&self, target: T) -> Result<Proxy<T, I>, ConstructionError>
    where
        I: Interface + ?Sized,
    {
        if self.config.require_profiled_operations
            && !I::operations().iter().any(|op| op.is_profiled())
        {
            return Err(ConstructionError::NoProfiledOperations { interface: I::NAME });
        }
        Proxy::new(
            target,
            Arc::clone(&self.clock),
            Arc::clone(&self.state),
            self.start_time,
        )
    }

    /// Shared state every proxy of this profiler records into
    pub fn state(&self) -> &Arc<ProfilingState> {
        &self.state
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Write the report to `writer` in the configured format
    pub fn write_data<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), ReportError> {
        report::write_report(writer, &self.state, &self.start_time, self.config.format)
    }

    /// Append the report to `path`, creating the file if needed
    pub fn write_data_to_path(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        self.write_data(&mut writer)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), entries = self.state.len(), "wrote profiling report");
        Ok(())
    }

    /// Write the report to the configured output path, or stdout when unset
    pub fn write_report(&self) -> Result<(), ReportError> {
        match &self.config.output_path {
            Some(path) => self.write_data_to_path(path),
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                self.write_data(&mut handle)?;
                handle.flush()?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::operation::Operation;
    use crate::report::ReportFormat;
    use chrono::TimeZone;
    use std::time::Duration;

    trait Sink {
        fn accept(&self, item: u32) -> bool;
    }

    impl Interface for dyn Sink {
        const NAME: &'static str = "Sink";

        fn operations() -> &'static [Operation] {
            const OPERATIONS: &[Operation] =
                &[Operation::passthrough("accept", "fn accept(&self, item: u32) -> bool")];
            OPERATIONS
        }
    }

    #[derive(Debug)]
    struct NullSink;

    impl Sink for NullSink {
        fn accept(&self, _item: u32) -> bool {
            true
        }
    }

    impl<T: Sink> Sink for Proxy<T, dyn Sink> {
        fn accept(&self, item: u32) -> bool {
            self.invoke("accept", |target| target.accept(item))
        }
    }

    fn fixed_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::starting_at(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap(),
        ))
    }

    #[test]
    fn test_start_time_taken_from_clock() {
        let profiler = Profiler::new(fixed_clock());
        assert_eq!(
            profiler.start_time(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap()
        );
    }

    #[test]
    fn test_unmarked_interface_allowed_by_default() {
        let profiler = Profiler::new(fixed_clock());
        let sink = profiler.wrap::<dyn Sink, _>(NullSink).unwrap();

        for item in 0..10 {
            assert!(sink.accept(item));
        }
        assert!(profiler.state().is_empty());
    }

    #[test]
    fn test_strict_config_rejects_unmarked_interface() {
        let profiler = Profiler::with_config(fixed_clock(), ProfilerConfig::default().strict());
        let err = profiler.wrap::<dyn Sink, _>(NullSink).unwrap_err();
        assert_eq!(err, ConstructionError::NoProfiledOperations { interface: "Sink" });
    }

    #[test]
    fn test_profilers_can_share_state() {
        let state = Arc::new(ProfilingState::new());
        let first = Profiler::with_state(fixed_clock(), Arc::clone(&state), ProfilerConfig::default());
        let second = Profiler::with_state(fixed_clock(), Arc::clone(&state), ProfilerConfig::default());

        assert!(Arc::ptr_eq(first.state(), second.state()));
    }

    #[test]
    fn test_write_data_to_path_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.txt");
        let profiler = Profiler::new(fixed_clock());

        let key = Operation::profiled("crawl", "fn crawl(&self)").id();
        profiler.state().record("Crawler", key, Duration::from_millis(120));

        profiler.write_data_to_path(&path).unwrap();
        profiler.write_data_to_path(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let run = "Run at Fri, 1 Mar 2024 09:05:07 GMT\nCrawler#crawl took 0m 0s 120ms\n\n";
        assert_eq!(contents, format!("{run}{run}"));
    }

    #[test]
    fn test_write_report_uses_configured_path_and_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let config = ProfilerConfig::default()
            .with_output_path(&path)
            .with_format(ReportFormat::Json);
        let profiler = Profiler::with_config(fixed_clock(), config);

        profiler.write_report().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["entries"].as_array().unwrap().is_empty());
    }
}
