//! Command runner abstractions.
//!
//! [`CommandRunner`] launches one shell command and reports what happened;
//! [`Executor`] layers the strict and permissive failure policies on top.

use std::process::{Command, Stdio};

use crate::{abort, Error, Result};

/// Outcome of a single shell invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code, `None` when the child was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait describing how to execute commands for targets.
pub trait CommandRunner {
    fn execute(&self, command: &str) -> Result<ExecutionResult>;
}

/// Runs commands through `<shell> -c`, capturing stdout and stderr.
///
/// The child inherits the working directory, environment and stdin.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl CommandRunner for ShellRunner {
    fn execute(&self, command: &str) -> Result<ExecutionResult> {
        tracing::debug!(shell = %self.shell, command, "spawning");
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::inherit())
            .output()
            .map_err(|source| Error::Spawn {
                shell: self.shell.clone(),
                command: command.to_string(),
                source,
            })?;

        let result = ExecutionResult {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(command, code = ?result.code, "finished");
        Ok(result)
    }
}

/// A runner that prints each command instead of running it.
#[derive(Debug, Clone, Default)]
pub struct DryRunner {
    quiet: bool,
}

impl DryRunner {
    /// Helper constructor for the dry runner.
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// A dry runner that only logs.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

impl CommandRunner for DryRunner {
    fn execute(&self, command: &str) -> Result<ExecutionResult> {
        tracing::info!(command, "dry run");
        if !self.quiet {
            println!("[dry-run] {command}");
        }
        Ok(ExecutionResult {
            code: Some(0),
            ..ExecutionResult::default()
        })
    }
}

/// Applies the strict and permissive failure policies to a [`CommandRunner`].
pub struct Executor {
    runner: Box<dyn CommandRunner>,
}

impl Executor {
    pub fn new(runner: impl CommandRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
        }
    }

    /// Executor backed by `sh -c`.
    pub fn shell() -> Self {
        Self::new(ShellRunner::default())
    }

    /// Run `command` and return its trimmed stdout, or the failure.
    pub fn try_strict(&self, command: &str) -> Result<String> {
        let result = self.runner.execute(command)?;
        if !result.success() {
            return Err(Error::ShellFailure {
                command: command.to_string(),
                code: result.code,
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(result.stdout.trim().to_string())
    }

    /// Run `command` and return its trimmed stdout.
    ///
    /// Any failure prints the command's stderr and a diagnostic, then exits
    /// the process.
    pub fn run_strict(&self, command: &str) -> String {
        match self.try_strict(command) {
            Ok(stdout) => stdout,
            Err(err) => {
                if let Error::ShellFailure { stderr, .. } = &err {
                    if !stderr.is_empty() {
                        eprintln!("{stderr}");
                    }
                }
                abort(&err)
            }
        }
    }

    /// Run `command`, ignoring any failure.
    pub fn run_permissive(&self, command: &str) {
        match self.runner.execute(command) {
            Ok(result) if result.success() => {}
            Ok(result) => {
                tracing::warn!(command, code = ?result.code, "ignoring command failure");
            }
            Err(err) => tracing::warn!(command, error = %err, "ignoring command failure"),
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::shell()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Records commands and answers with a fixed result.
    struct Scripted {
        seen: Rc<RefCell<Vec<String>>>,
        result: ExecutionResult,
    }

    impl CommandRunner for Scripted {
        fn execute(&self, command: &str) -> Result<ExecutionResult> {
            self.seen.borrow_mut().push(command.to_string());
            Ok(self.result.clone())
        }
    }

    #[test]
    fn strict_returns_trimmed_stdout() {
        let executor = Executor::shell();
        let out = executor.try_strict("printf '  hello world \\n\\n'").unwrap();
        assert_eq!(out, "hello world");
        assert_eq!(executor.run_strict("echo ok"), "ok");
    }

    #[test]
    fn strict_reports_exit_code_and_stderr() {
        let executor = Executor::shell();
        let err = executor.try_strict("echo boom >&2; exit 3").unwrap_err();
        match err {
            Error::ShellFailure {
                command,
                code,
                stderr,
            } => {
                assert_eq!(command, "echo boom >&2; exit 3");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shell_metacharacters_are_honoured() {
        let executor = Executor::shell();
        let out = executor.try_strict("printf 'a\\nb\\nc\\n' | wc -l").unwrap();
        assert_eq!(out, "3");
    }

    #[test]
    fn permissive_swallows_failure() {
        let executor = Executor::shell();
        executor.run_permissive("exit 7");
        executor.run_permissive("rm /definitely/not/here/breadmake");
    }

    #[test]
    fn missing_shell_is_a_spawn_error() {
        let executor = Executor::new(ShellRunner::new("/no/such/shell"));
        let err = executor.try_strict("true").unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }), "got: {err}");
        executor.run_permissive("true");
    }

    #[test]
    fn runs_in_caller_working_directory() {
        let executor = Executor::shell();
        let cwd = std::env::current_dir().unwrap();
        let out = executor.try_strict("pwd -P").unwrap();
        assert_eq!(
            std::fs::canonicalize(out).unwrap(),
            std::fs::canonicalize(cwd).unwrap()
        );
    }

    #[test]
    fn executor_delegates_to_runner() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let executor = Executor::new(Scripted {
            seen: Rc::clone(&seen),
            result: ExecutionResult {
                code: Some(1),
                stdout: String::new(),
                stderr: " nope \n".into(),
            },
        });

        executor.run_permissive("first");
        let err = executor.try_strict("second").unwrap_err();
        assert!(matches!(err, Error::ShellFailure { ref stderr, .. } if stderr == "nope"));
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn dry_runner_reports_success() {
        let executor = Executor::new(DryRunner::quiet());
        assert_eq!(executor.try_strict("exit 1").unwrap(), "");
    }
}
