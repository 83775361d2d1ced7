//! Breadfile configuration models and loaders.
//!
//! A Breadfile declares targets as ordered shell steps:
//!
//! ```toml
//! shell = "sh"
//! default = "build"
//!
//! [[target]]
//! name = "clean"
//! doc = "remove all build artifacts"
//! steps = [{ pass = "rm -rf dist" }]
//!
//! [[target]]
//! name = "build"
//! steps = [{ target = "clean" }, { strict = "cargo build" }]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use crate::dispatch::Context;
use crate::registry::Registry;
use crate::runner::ShellRunner;
use crate::{Error, Result};

/// File name looked up in the working directory when none is given.
pub const DEFAULT_BREADFILE: &str = "Breadfile.toml";

/// Top-level Breadfile contents.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Interpreter used as `<shell> -c <command>`.
    pub shell: Option<String>,
    /// Target run when none is named on the command line.
    pub default: Option<String>,
    /// Targets in declaration order.
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub name: String,
    pub doc: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One step of a Breadfile target.
///
/// Each step table holds exactly one action key; any other key is an error.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum Step {
    Strict(StrictStep),
    Pass(PassStep),
    Check(CheckStep),
    Target(TargetStep),
    Echo(EchoStep),
}

/// Run a command; any failure stops the whole process.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct StrictStep {
    pub strict: String,
    /// Print the captured stdout.
    #[serde(default)]
    pub capture: bool,
}

/// Run a command and ignore failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct PassStep {
    pub pass: String,
}

/// Run a command; failure fails the enclosing target.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct CheckStep {
    pub check: String,
}

/// Run another target in-process.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct TargetStep {
    pub target: String,
}

/// Print a line of text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct EchoStep {
    pub echo: String,
}

impl Step {
    /// Execute this step; `false` stops the enclosing target.
    fn apply(&self, ctx: &Context<'_>) -> bool {
        match self {
            Step::Strict(StrictStep { strict, capture }) => {
                let out = ctx.shell_strict(strict);
                if *capture && !out.is_empty() {
                    println!("{out}");
                }
                true
            }
            Step::Pass(PassStep { pass }) => {
                ctx.shell_pass(pass);
                true
            }
            Step::Check(CheckStep { check }) => match ctx.try_shell(check) {
                Ok(_) => true,
                Err(err) => {
                    if let Error::ShellFailure { stderr, .. } = &err {
                        if !stderr.is_empty() {
                            eprintln!("{stderr}");
                        }
                    }
                    eprintln!("{err}");
                    false
                }
            },
            Step::Target(TargetStep { target }) => ctx.run(target),
            Step::Echo(EchoStep { echo }) => {
                println!("{echo}");
                true
            }
        }
    }

    fn nested_target(&self) -> Option<&str> {
        match self {
            Step::Target(TargetStep { target }) => Some(target),
            _ => None,
        }
    }
}

impl FromStr for Config {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl Config {
    /// Runner for the configured shell.
    pub fn runner(&self) -> ShellRunner {
        self.shell
            .as_deref()
            .map(ShellRunner::new)
            .unwrap_or_default()
    }

    /// Build a registry holding every configured target.
    ///
    /// Fails when a name is invalid, a `target` step names something that is
    /// not registered, `target` steps form a cycle, or `default` is unknown.
    pub fn build_registry(&self) -> Result<Registry> {
        let mut registry = Registry::new();

        for target in &self.targets {
            let steps = target.steps.clone();
            registry.register(&target.name, target.doc.as_deref(), move |ctx: &Context<'_>| {
                steps.iter().all(|step| step.apply(ctx))
            })?;
        }

        for target in &self.targets {
            for nested in target.steps.iter().filter_map(Step::nested_target) {
                if !registry.contains(nested) {
                    return Err(Error::Validation(format!(
                        "target `{}` runs unknown target `{nested}`",
                        target.name
                    )));
                }
            }
        }
        self.check_cycles()?;

        if let Some(default) = &self.default {
            registry.set_default(default)?;
        }
        Ok(registry)
    }

    /// Reject `target` steps that lead back to a target already running.
    fn check_cycles(&self) -> Result<()> {
        // Duplicates are ignored at registration, so the first declaration
        // is the one that runs.
        let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
        for target in &self.targets {
            graph
                .entry(target.name.as_str())
                .or_insert_with(|| target.steps.iter().filter_map(Step::nested_target).collect());
        }

        let mut done = HashSet::new();
        for target in &self.targets {
            let mut path = Vec::new();
            visit(&graph, &target.name, &mut path, &mut done)?;
        }
        Ok(())
    }
}

fn visit<'a>(
    graph: &HashMap<&'a str, Vec<&'a str>>,
    name: &'a str,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
) -> Result<()> {
    if done.contains(name) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|&seen| seen == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name);
        return Err(Error::Validation(format!(
            "target cycle: {}",
            cycle.join(" -> ")
        )));
    }

    path.push(name);
    for &nested in graph.get(name).into_iter().flatten() {
        visit(graph, nested, path, done)?;
    }
    path.pop();
    done.insert(name);
    Ok(())
}

/// Load and parse a Breadfile from `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let config = contents.parse::<Config>().map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded breadfile");
    Ok(config)
}
