//! Tracing subscriber setup for the CLI.
//!
//! The library only emits events; installing a subscriber is left to the
//! binary. `RUST_LOG`, when set, wins over the `-v` count.

use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Map the `-v` count to a filter directive.
pub fn verbosity_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",  // Default: informational messages and above
        1 => "debug", // -v: per-stage timings
        _ => "trace", // -vv and up
    }
}

/// Build the filter: `RUST_LOG` first, the verbosity level otherwise.
pub fn build_filter(verbosity: u8) -> Result<EnvFilter, Box<dyn Error + Send + Sync>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(verbosity_filter(verbosity))?),
    }
}

/// Install a compact stderr subscriber. Stdout stays reserved for results.
pub fn init_cli_tracing(verbosity: u8) -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbosity)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
}
