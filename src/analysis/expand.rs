//! `${name}` placeholder expansion.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Matches `${...}` with the shortest non-empty name.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{(.+?)\}").unwrap());

/// Source of values for `${name}` placeholders.
pub trait VariableLookup: Send + Sync {
    /// Value of the variable, or `None` when it is undefined.
    fn lookup(&self, name: &str) -> Option<String>;
}

impl VariableLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Variables declared in settings, falling back to the process environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    overrides: HashMap<String, String>,
}

impl Environment {
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }
}

impl VariableLookup for Environment {
    fn lookup(&self, name: &str) -> Option<String> {
        self.overrides
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }
}

/// Replace every resolvable `${name}` in `text` with its value.
///
/// Placeholders whose name is undefined, and anything that only looks like a
/// placeholder (`${}`, `$name}`, `{name}$`), are left untouched. Substituted
/// values are not expanded again.
pub fn expand<'a>(text: &'a str, vars: &dyn VariableLookup) -> Cow<'a, str> {
    PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| match vars.lookup(&caps[1]) {
        Some(value) => value,
        None => caps[0].to_string(),
    })
}
