use crate::env::Environment;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure,
/// mirroring the convention used by POSIX shells.
pub type ExitCode = i32;

/// Exit code reported when a command name cannot be resolved.
pub const NOT_FOUND_EXIT_CODE: ExitCode = 127;

/// Object-safe trait for any command that can be executed by the shell.
///
/// Implemented by built-ins via a blanket impl and by the external command
/// launcher. Builtins write their output to `stdout`; external commands
/// inherit the process descriptors and ignore it.
pub trait ExecutableCommand {
    /// Executes the command against the given environment context.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
/// Implementations can use the environment to resolve executables (e.g.
/// PATH lookup for external programs).
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;

    /// The builtin name this factory registers, if it registers one.
    ///
    /// External launchers return `None`. Used by the `type` builtin and by
    /// registry introspection in tests.
    fn builtin_name(&self) -> Option<&'static str> {
        None
    }
}
