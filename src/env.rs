use crate::command::ExitCode;
use std::collections::HashMap;
use std::env as stdenv;

/// The shell's view of the process environment.
///
/// The environment contains:
/// - `vars`: variables set by the shell itself. They shadow the process
///   environment and are exported to executed commands.
/// - `exit_request`: set by the `exit` builtin; the read loop checks it after
///   every command.
///
/// Lookups that miss `vars` read the live process environment, so a `PATH`
/// change made by the embedding program is seen by the next command.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Variables set by the shell (e.g., PATH in tests).
    pub vars: HashMap<String, String>,
    /// Exit code requested by the `exit` builtin, if any.
    pub exit_request: Option<ExitCode>,
}

impl Environment {
    /// Create an environment with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Ask the read loop to terminate with `code`.
    pub fn request_exit(&mut self, code: ExitCode) {
        self.exit_request = Some(code);
    }
}
