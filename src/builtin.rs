use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::external::find_command_path;
use crate::interpreter::Factory;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Names of the commands implemented inside the shell process.
///
/// Dispatch itself goes through the factory chain; this list backs the
/// `type` builtin and registry introspection.
pub const BUILTIN_NAMES: &[&str] = &["exit", "echo", "type", "pwd", "cd"];

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command using the provided output stream and environment.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for
    /// error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match BuiltinCommand::execute(*self, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                // Builtin failures are user-facing and non-fatal.
                writeln!(stdout, "{}", e)?;
                Ok(1)
            }
        }
    }
}

/// Result of an argh parse failure (or `--help`): prints argh's message
/// instead of running anything.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }

    fn builtin_name(&self) -> Option<&'static str> {
        Some(T::name())
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// A bare `~` (or no target at all) switches to $HOME.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let requested = self.target.as_deref().unwrap_or("~");

        let target = if requested == "~" {
            match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => return Err(anyhow::anyhow!("cd: HOME not set")),
            }
        } else {
            PathBuf::from(requested)
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        // On failure the working directory is left unchanged.
        let canonical = fs::canonicalize(&new_dir).map_err(|_| {
            anyhow::anyhow!("cd: {}: No such file or directory", requested)
        })?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// End the shell session. Any arguments are ignored.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; POSIX would take an exit status here
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

/// Write the arguments to standard output, separated by single spaces.
/// A trailing newline is printed unless -n is given.
pub struct Echo {
    /// do not output the trailing newline
    pub no_newline: bool,
    /// values to print as-is, separated by spaces
    pub args: Vec<String>,
}

/// Hand-written so every word after an optional leading `-n` is taken
/// verbatim; argh's switch handling would reject words like `-e` or
/// `--help` instead of printing them.
impl FromArgs for Echo {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        let (no_newline, rest) = match args.split_first() {
            Some((first, rest)) if *first == "-n" => (true, rest),
            _ => (false, args),
        };
        Ok(Echo {
            no_newline,
            args: rest.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Report how a command name would be resolved: as a shell builtin, as an
/// executable found on PATH, or not at all.
pub struct Type {
    #[argh(positional)]
    /// command name to look up
    pub name: String,
}

impl BuiltinCommand for Type {
    fn name() -> &'static str {
        "type"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        if BUILTIN_NAMES.contains(&self.name.as_str()) {
            writeln!(stdout, "{} is a shell builtin", self.name)?;
            return Ok(0);
        }
        if let Some(paths) = env.get_var("PATH") {
            if let Some(found) = find_command_path(OsStr::new(&paths), Path::new(&self.name)) {
                writeln!(stdout, "{} is {}", self.name, found.display())?;
                return Ok(0);
            }
        }
        writeln!(stdout, "{}: not found", self.name)?;
        Ok(1)
    }
}
