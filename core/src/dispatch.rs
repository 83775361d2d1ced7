//! Argument dispatch and the context handed to target bodies.

use crate::registry::Registry;
use crate::runner::Executor;
use crate::{abort, Error, Result};

/// What a running target can reach: the registry, the executor and the
/// program name.
///
/// Nested targets are invoked in-process through [`Context::try_run`] or
/// [`Context::run`]; their result goes back to the caller and is never
/// turned into a process exit.
pub struct Context<'a> {
    registry: &'a Registry,
    executor: &'a Executor,
    program: &'a str,
}

impl<'a> Context<'a> {
    pub fn new(registry: &'a Registry, executor: &'a Executor, program: &'a str) -> Self {
        Self {
            registry,
            executor,
            program,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn executor(&self) -> &'a Executor {
        self.executor
    }

    pub fn program(&self) -> &'a str {
        self.program
    }

    /// Invoke the target `name` and return its result.
    pub fn try_run(&self, name: &str) -> Result<bool> {
        let target = self.registry.lookup(name).ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })?;
        tracing::debug!(target_name = name, "running target");
        let ok = target.invoke(self);
        tracing::debug!(target_name = name, ok, "target finished");
        Ok(ok)
    }

    /// Invoke the target `name`, exiting the process if it does not exist.
    pub fn run(&self, name: &str) -> bool {
        self.try_run(name).unwrap_or_else(|err| abort(&err))
    }

    /// See [`Executor::run_strict`].
    pub fn shell_strict(&self, command: &str) -> String {
        self.executor.run_strict(command)
    }

    /// See [`Executor::run_permissive`].
    pub fn shell_pass(&self, command: &str) {
        self.executor.run_permissive(command)
    }

    /// See [`Executor::try_strict`].
    pub fn try_shell(&self, command: &str) -> Result<String> {
        self.executor.try_strict(command)
    }
}

/// Resolves command-line arguments to a target and runs it.
pub struct Dispatcher<'a> {
    registry: &'a Registry,
    executor: &'a Executor,
    program: String,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a Registry, executor: &'a Executor, program: impl Into<String>) -> Self {
        Self {
            registry,
            executor,
            program: program.into(),
        }
    }

    /// Pick the target named by `args` (positional arguments only).
    pub fn resolve<'s>(&'s self, args: &'s [String]) -> Result<&'s str> {
        match args {
            [] => Ok(self.registry.default_target()),
            [name] => {
                if self.registry.contains(name) {
                    Ok(name.as_str())
                } else {
                    Err(Error::NotFound { name: name.clone() })
                }
            }
            _ => Err(Error::Usage {
                program: self.program.clone(),
                targets: self.registry.names(),
            }),
        }
    }

    /// Run the target selected by `args`.
    ///
    /// A target returning `false` becomes [`Error::TargetFailed`].
    pub fn dispatch(&self, args: &[String]) -> Result<()> {
        let name = self.resolve(args)?;
        tracing::debug!(target_name = name, "dispatching");

        let ctx = Context::new(self.registry, self.executor, &self.program);
        if ctx.try_run(name)? {
            Ok(())
        } else {
            Err(Error::TargetFailed {
                name: name.to_string(),
            })
        }
    }

    /// Dispatch `args` and exit the process with the outcome.
    pub fn compile(&self, args: &[String]) -> ! {
        match self.dispatch(args) {
            Ok(()) => std::process::exit(0),
            Err(err) => abort(&err),
        }
    }
}
