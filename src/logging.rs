//! Logging configuration.
//!
//! Logs go to stderr and are off unless `TINYSH_LOG` asks for them, so they
//! never interleave with command output by accident.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `TINYSH_LOG=debug`.
pub const LOG_ENV: &str = "TINYSH_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"))
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
