use std::path::Path;

use anyhow::Result;
use breadmake_core::{logging, Context, Dispatcher, DryRunner, Executor, Registry};
use clap::{ArgAction, Parser};

const DEFAULT_VERSION: &str = "0.0.0";
const MANIFEST: &str = "core/Cargo.toml";

#[derive(Debug, Parser)]
#[command(about = "Utility tasks for developing the breadmake workspace")]
struct Xtask {
    /// Print commands instead of running them.
    #[arg(long)]
    dry_run: bool,
    /// Raise log verbosity.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Optional task name (run `help` to list them)
    task: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Xtask::parse();
    logging::init(cli.verbose)?;

    let registry = tasks()?;
    let executor = if cli.dry_run {
        Executor::new(DryRunner::new())
    } else {
        Executor::shell()
    };
    Dispatcher::new(&registry, &executor, "cargo xtask").compile(&cli.task)
}

fn tasks() -> Result<Registry> {
    let mut registry = Registry::new();

    registry.register("build", Some("build every workspace member"), build)?;
    registry.register("clean", Some("remove build artifacts"), clean)?;
    registry.register("fmt", Some("format all crates"), fmt)?;
    registry.register("fmt_check", Some("verify formatting without writing"), fmt_check)?;
    registry.register("check", Some("run clippy with warnings denied"), check)?;
    registry.register("test", Some("run the workspace test suite"), test)?;
    registry.register("version", Some("print the current version"), version)?;
    registry.register("ci", Some("formatting, lints and tests, stopping at the first failure"), ci)?;

    Ok(registry)
}

fn build(ctx: &Context<'_>) -> bool {
    ctx.shell_strict("cargo build --workspace");
    true
}

fn clean(ctx: &Context<'_>) -> bool {
    ctx.shell_pass("cargo clean");
    ctx.shell_pass("find . -name '*.rs.bk' -not -path './target/*' | xargs rm -f");
    true
}

fn fmt(ctx: &Context<'_>) -> bool {
    ctx.shell_strict("cargo fmt --all");
    true
}

fn fmt_check(ctx: &Context<'_>) -> bool {
    report(ctx, "cargo fmt --all -- --check")
}

fn check(ctx: &Context<'_>) -> bool {
    report(ctx, "cargo clippy --workspace --all-targets -- -D warnings")
}

fn test(ctx: &Context<'_>) -> bool {
    report(ctx, "cargo test --workspace")
}

fn version(_ctx: &Context<'_>) -> bool {
    println!("Version: {}", read_version(Path::new(MANIFEST)));
    true
}

fn ci(ctx: &Context<'_>) -> bool {
    ["fmt_check", "check", "test"]
        .into_iter()
        .all(|name| ctx.run(name))
}

/// Run `command`, turning a failure into a `false` result instead of exiting.
fn report(ctx: &Context<'_>, command: &str) -> bool {
    match ctx.try_shell(command) {
        Ok(out) => {
            if !out.is_empty() {
                println!("{out}");
            }
            true
        }
        Err(err) => {
            eprintln!("{err}");
            false
        }
    }
}

/// `package.version` from a Cargo manifest, or [`DEFAULT_VERSION`].
fn read_version(manifest: &Path) -> String {
    std::fs::read_to_string(manifest)
        .ok()
        .and_then(|contents| contents.parse::<toml::Table>().ok())
        .and_then(|table| {
            table
                .get("package")?
                .get("version")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_VERSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_workspace_tasks() {
        let registry = tasks().unwrap();
        assert_eq!(registry.default_target(), "build");
        assert_eq!(
            registry.names(),
            vec!["help", "build", "clean", "fmt", "fmt_check", "check", "test", "version", "ci"]
        );
    }

    #[test]
    fn version_falls_back_when_manifest_is_missing() {
        assert_eq!(read_version(Path::new("does/not/exist.toml")), DEFAULT_VERSION);
    }

    #[test]
    fn version_reads_package_table() {
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        assert_eq!(read_version(&manifest), "0.1.0");
    }

    #[test]
    fn ci_runs_nested_tasks_in_dry_run() {
        let registry = tasks().unwrap();
        let executor = Executor::new(DryRunner::quiet());
        let dispatcher = Dispatcher::new(&registry, &executor, "cargo xtask");
        assert!(dispatcher.dispatch(&["ci".to_string()]).is_ok());
    }
}
