//! Subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Environment variable read when no `-v` flag is given.
pub const LOG_ENV: &str = "BREADMAKE_LOG";

/// Filter for a `-v` count: flags win over [`LOG_ENV`], which wins over `warn`.
pub fn filter(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Install a stderr subscriber so stdout carries only command output.
pub fn init(verbose: u8) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}
