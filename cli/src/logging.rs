//! Logging initialization.
//!
//! Everything goes to stderr so stdout stays clean for the generated document.

use crate::error::{CliError, CliResult};
use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) -> CliResult<()> {
    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_directive(verbose).to_string()),
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| CliError::General(format!("Failed to initialize logging: {}", e)))
}
