//! Core crate for breadmake: target registry, shell execution and dispatch.
//!
//! A task file builds a [`Registry`], registers its targets and hands the
//! registry to a [`Dispatcher`]:
//!
//! ```no_run
//! use breadmake_core::{Dispatcher, Executor, Registry};
//!
//! let mut registry = Registry::new();
//! registry
//!     .register("clean", Some("remove build artifacts"), |ctx| {
//!         ctx.shell_pass("rm -rf dist");
//!         true
//!     })
//!     .unwrap();
//!
//! let executor = Executor::shell();
//! let args: Vec<String> = std::env::args().skip(1).collect();
//! Dispatcher::new(&registry, &executor, "make").compile(&args);
//! ```

pub mod config;
pub mod dispatch;
#[cfg(feature = "logging")]
pub mod logging;
pub mod registry;
pub mod runner;

pub use config::{
    load_config, CheckStep, Config, EchoStep, PassStep, Step, StrictStep, TargetConfig,
    TargetStep, DEFAULT_BREADFILE,
};
pub use dispatch::{Context, Dispatcher};
pub use registry::{Registry, Target, HELP_TARGET};
pub use runner::{CommandRunner, DryRunner, ExecutionResult, Executor, ShellRunner};

use std::path::PathBuf;

use thiserror::Error;

/// Exit status used for every failure the engine reports.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Common error type for the breadmake engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A target declaration or configuration was rejected before dispatch.
    #[error("invalid target declaration: {0}")]
    Validation(String),

    /// No target is registered under the requested name.
    #[error("invalid target name: {name}")]
    NotFound { name: String },

    /// A shell command exited unsuccessfully.
    #[error("command `{command}` {}", describe_status(.code))]
    ShellFailure {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The shell interpreter itself could not be started.
    #[error("failed to spawn `{shell}` for `{command}`: {source}")]
    Spawn {
        shell: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A target body reported failure.
    #[error("target: {name} failed")]
    TargetFailed { name: String },

    /// Too many positional arguments were supplied.
    #[error("usage: {program} [target]\ntargets: {}", .targets.join(", "))]
    Usage {
        program: String,
        targets: Vec<String>,
    },

    #[error("failed to read {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialise logging: {0}")]
    Logging(String),

    #[error("failed to parse {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Convenient alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("returned non-zero exit status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// Print `err` to stderr and terminate the process with [`FAILURE_EXIT_CODE`].
pub fn abort(err: &Error) -> ! {
    tracing::debug!(error = ?err, "aborting");
    eprintln!("{err}");
    std::process::exit(FAILURE_EXIT_CODE)
}
