//! Tracing bootstrap for binaries embedding the orchestrator.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber: `RUST_LOG` when set, otherwise the
/// given default directive. Logs go to stderr so compiled output on
/// stdout stays clean. Safe to call more than once; later calls are
/// no-ops.
pub fn init_telemetry(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
