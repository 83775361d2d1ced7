//! Target registry.
//!
//! Targets are registered once at load time and looked up by name during
//! dispatch. The registry is seeded with the built-in [`HELP_TARGET`] before
//! any caller-defined target is added.

use std::collections::HashMap;
use std::fmt;

use crate::dispatch::Context;
use crate::{Error, Result};

/// Name of the built-in target that lists every registered target.
pub const HELP_TARGET: &str = "help";

/// Documentation shown for targets registered without one.
pub const NO_DOCUMENTATION: &str = "no documentation";

const RESERVED_NAMES: &[&str] = &[HELP_TARGET];

/// Signature every target body conforms to.
///
/// The [`Context`] is the engine's handle for shell execution and nested
/// runs; bodies take no arguments of their own.
pub type TargetFn = dyn Fn(&Context<'_>) -> bool;

/// A named unit of work.
pub struct Target {
    name: String,
    doc: String,
    body: Box<TargetFn>,
}

impl Target {
    fn new(name: &str, doc: Option<&str>, body: Box<TargetFn>) -> Self {
        let doc = doc
            .map(str::trim)
            .filter(|doc| !doc.is_empty())
            .unwrap_or(NO_DOCUMENTATION);
        Self {
            name: name.to_string(),
            doc: doc.to_string(),
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Run the target body and report whether it succeeded.
    pub fn invoke(&self, ctx: &Context<'_>) -> bool {
        (self.body)(ctx)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({}/{})", self.name, self.doc)
    }
}

/// Named targets plus the default-target pointer.
#[derive(Debug)]
pub struct Registry {
    targets: Vec<Target>,
    index: HashMap<String, usize>,
    default: Option<String>,
}

impl Registry {
    /// Create a registry holding only the built-in `help` target.
    pub fn new() -> Self {
        let mut registry = Self {
            targets: Vec::new(),
            index: HashMap::new(),
            default: None,
        };
        registry.insert(Target::new(
            HELP_TARGET,
            None,
            Box::new(|ctx: &Context<'_>| {
                print!("{}", ctx.registry().help_text(ctx.program()));
                true
            }),
        ));
        registry
    }

    /// Register `body` under `name`.
    ///
    /// Re-registering an existing name is a no-op; the first registration
    /// wins. The first target registered becomes the default unless
    /// [`Registry::set_default`] overrides it.
    pub fn register<F>(&mut self, name: &str, doc: Option<&str>, body: F) -> Result<()>
    where
        F: Fn(&Context<'_>) -> bool + 'static,
    {
        validate_name(name)?;

        if self.index.contains_key(name) {
            tracing::debug!(target_name = name, "ignoring duplicate registration");
            return Ok(());
        }

        self.insert(Target::new(name, doc, Box::new(body)));
        if self.default.is_none() {
            self.default = Some(name.to_string());
        }
        tracing::debug!(target_name = name, "registered target");
        Ok(())
    }

    /// Make `name` the target run when no name is given.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.contains(name) {
            return Err(Error::NotFound {
                name: name.to_string(),
            });
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    /// Name of the default target; `help` until a target is registered.
    pub fn default_target(&self) -> &str {
        self.default.as_deref().unwrap_or(HELP_TARGET)
    }

    pub fn lookup(&self, name: &str) -> Option<&Target> {
        self.index.get(name).map(|&idx| &self.targets[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// `(name, doc)` pairs in registration order, `help` first.
    pub fn list_all(&self) -> Vec<(&str, &str)> {
        self.targets
            .iter()
            .map(|target| (target.name(), target.doc()))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.name.clone()).collect()
    }

    /// Render the listing printed by the built-in `help` target.
    pub fn help_text(&self, program: &str) -> String {
        let width = self
            .targets
            .iter()
            .map(|t| t.name.len())
            .max()
            .unwrap_or(0);

        let mut out = format!("usage: {program} [target]\ntargets:\n");
        for (name, doc) in self.list_all() {
            out.push_str(&format!("{name:<width$} - {doc}\n"));
        }
        out
    }

    fn insert(&mut self, target: Target) {
        self.index.insert(target.name.clone(), self.targets.len());
        self.targets.push(target);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that `name` can be registered and typed on a command line.
pub fn validate_name(name: &str) -> Result<()> {
    if RESERVED_NAMES.contains(&name) {
        return Err(Error::Validation(format!(
            "target name `{name}` is taken by a built-in target"
        )));
    }
    if name.is_empty() {
        return Err(Error::Validation("target name cannot be empty".into()));
    }
    if name.starts_with('-') {
        return Err(Error::Validation(format!(
            "target name `{name}` cannot start with `-`"
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(Error::Validation(format!(
            "target name `{name}` contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::runner::{DryRunner, Executor};

    fn counting(counter: &Rc<Cell<u32>>, result: bool) -> impl Fn(&Context<'_>) -> bool {
        let counter = Rc::clone(counter);
        move |_: &Context<'_>| {
            counter.set(counter.get() + 1);
            result
        }
    }

    #[test]
    fn new_registry_holds_only_help() {
        let registry = Registry::new();
        assert_eq!(registry.names(), vec!["help"]);
        assert_eq!(registry.default_target(), HELP_TARGET);
    }

    #[test]
    fn lookup_returns_registered_body_and_doc() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        registry
            .register("clean", Some("  remove build artifacts \n"), counting(&calls, true))
            .unwrap();

        let target = registry.lookup("clean").expect("clean registered");
        assert_eq!(target.name(), "clean");
        assert_eq!(target.doc(), "remove build artifacts");

        let executor = Executor::new(DryRunner::quiet());
        let ctx = Context::new(&registry, &executor, "make");
        assert!(target.invoke(&ctx));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn missing_or_blank_doc_uses_placeholder() {
        let mut registry = Registry::new();
        registry.register("a", None, |_| true).unwrap();
        registry.register("b", Some("   "), |_| true).unwrap();
        assert_eq!(registry.lookup("a").unwrap().doc(), NO_DOCUMENTATION);
        assert_eq!(registry.lookup("b").unwrap().doc(), NO_DOCUMENTATION);
    }

    #[test]
    fn help_is_reserved() {
        let mut registry = Registry::new();
        let err = registry.register("help", Some("mine"), |_| false).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got: {err}");
        assert_eq!(registry.names(), vec!["help"]);
        assert_eq!(registry.lookup("help").unwrap().doc(), NO_DOCUMENTATION);
        assert_eq!(registry.default_target(), HELP_TARGET);
    }

    #[test]
    fn malformed_names_are_rejected() {
        for name in ["", "-v", "two words", "semi;colon"] {
            assert!(
                matches!(validate_name(name), Err(Error::Validation(_))),
                "{name:?} should be rejected"
            );
        }
        for name in ["build", "type_check", "fmt-check", "v1.2"] {
            assert!(validate_name(name).is_ok(), "{name:?} should be accepted");
        }
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        registry
            .register("build", Some("first"), counting(&first, true))
            .unwrap();
        registry
            .register("build", Some("second"), counting(&second, false))
            .unwrap();

        assert_eq!(registry.names(), vec!["help", "build"]);
        let target = registry.lookup("build").unwrap();
        assert_eq!(target.doc(), "first");

        let executor = Executor::new(DryRunner::quiet());
        let ctx = Context::new(&registry, &executor, "make");
        assert!(target.invoke(&ctx));
        assert_eq!((first.get(), second.get()), (1, 0));
    }

    #[test]
    fn first_registration_becomes_default() {
        let mut registry = Registry::new();
        registry.register("clean", None, |_| true).unwrap();
        registry.register("build", None, |_| true).unwrap();
        assert_eq!(registry.default_target(), "clean");
    }

    #[test]
    fn explicit_default_wins() {
        let mut registry = Registry::new();
        registry.register("clean", None, |_| true).unwrap();
        registry.register("build", None, |_| true).unwrap();
        registry.set_default("build").unwrap();
        registry.register("publish", None, |_| true).unwrap();
        assert_eq!(registry.default_target(), "build");
    }

    #[test]
    fn set_default_rejects_unknown_name() {
        let mut registry = Registry::new();
        registry.register("clean", None, |_| true).unwrap();
        let err = registry.set_default("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound { ref name } if name == "missing"));
        assert_eq!(registry.default_target(), "clean");
    }

    #[test]
    fn list_all_keeps_registration_order() {
        let mut registry = Registry::new();
        registry.register("zeta", Some("last letter"), |_| true).unwrap();
        registry.register("alpha", None, |_| true).unwrap();
        assert_eq!(
            registry.list_all(),
            vec![
                ("help", NO_DOCUMENTATION),
                ("zeta", "last letter"),
                ("alpha", NO_DOCUMENTATION),
            ]
        );
    }

    #[test]
    fn help_text_aligns_names() {
        let mut registry = Registry::new();
        registry.register("clean", Some("remove artifacts"), |_| true).unwrap();
        registry
            .register("type_check", Some("run the type checker"), |_| true)
            .unwrap();

        let text = registry.help_text("make");
        let expected = "usage: make [target]\n\
                        targets:\n\
                        help       - no documentation\n\
                        clean      - remove artifacts\n\
                        type_check - run the type checker\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn help_target_succeeds() {
        let registry = Registry::new();
        let executor = Executor::new(DryRunner::quiet());
        let ctx = Context::new(&registry, &executor, "make");
        assert!(registry.lookup(HELP_TARGET).unwrap().invoke(&ctx));
    }
}
