pub mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

/// Install the `tracing` subscriber. Honors `RUST_LOG`; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,launchkit_lib=debug")),
        )
        .try_init();
}
