//! Tracing subscriber setup for applications embedding the profiler

use tracing_subscriber::EnvFilter;

/// Initialize a stderr tracing subscriber
///
/// With `debug` set, every level down to TRACE is enabled, which includes one
/// event per recorded call. Otherwise `RUST_LOG` decides. Returns `false` when
/// a global subscriber was already installed; that subscriber stays in place.
pub fn init_tracing(debug: bool) -> bool {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::from_default_env()
    };

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        // The embedding application owns the subscriber.
        tracing::debug!(error = %err, "tracing subscriber already installed");
        return false;
    }
    true
}
