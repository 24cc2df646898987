use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber.
///
/// Logs go to stderr so batch output on stdout stays machine-readable. The
/// level comes from `RUST_LOG` and defaults to `info`. Calling this twice is
/// harmless.
pub fn init() {
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
