//! tracing-subscriber の初期化

use tracing::debug;
use tracing_subscriber::EnvFilter;
use upshift_core::domain::Verbosity;

/// Default filter when `RUST_LOG` is unset.
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "info",
        Verbosity::Debug => "debug",
    }
}

/// Logs go to stderr; stdout belongs to the console progress output.
pub fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= Verbosity::Debug)
        .init();

    debug!(level = verbosity.level(), "upshift started");
}
