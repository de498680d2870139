use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Explicit, mutable view of the process environment used by the executor.
///
/// Commands read `PATH`/`HOME` and the working directory from here instead
/// of ambient global state, so tests can inject a deterministic context.
///
/// - `vars`: environment variables visible to executed commands.
/// - `current_dir`: the working directory for command execution.
/// - `should_exit`: set by the `exit` builtin; the REPL checks it after
///   every cycle.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, indicates that the interactive loop should exit.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment`.
    ///
    /// Copies `std::env::vars()` and initializes `current_dir` from
    /// `std::env::current_dir()`. `should_exit` starts false.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Build a hermetic environment from the given variables, for tests and
    /// embedders. No fallback to the process environment.
    pub fn with_vars<I, K, V>(vars: I, current_dir: PathBuf) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            current_dir,
            should_exit: false,
        }
    }

    /// Get the value of an environment variable from this context only.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override an environment variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
