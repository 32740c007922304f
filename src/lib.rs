//! calltime - transparent call-timing proxies for Rust traits
//!
//! Wrap any value implementing a capability trait in a [`Proxy`] that behaves
//! exactly like the value, except that operations declared `profiled` have
//! their execution time measured and accumulated into a shared
//! [`ProfilingState`] keyed by (concrete type, operation).
//!
//! Interfaces are declared with [`profiled_interface!`], or by hand through
//! [`Interface`] plus an adapter built on [`Proxy::invoke`].

pub mod clock;
pub mod config;
pub mod error;
pub mod interceptor;
mod macros;
pub mod operation;
pub mod profiler;
pub mod report;
pub mod state;
pub mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ProfilerConfig;
pub use error::{ConfigError, ConstructionError, InterceptError, ReportError};
pub use interceptor::{CallTimer, Proxy};
pub use operation::{Interface, Operation, OperationId, OperationTable};
pub use profiler::Profiler;
pub use report::ReportFormat;
pub use state::{CallKey, CallStats, ProfileEntry, ProfilingState};
