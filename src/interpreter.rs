use crate::arena::Arena;
use crate::command::{CommandFactory, ExitCode, NOT_FOUND_EXIT_CODE};
use crate::env::Environment;
use crate::lexer::Tokenizer;
use crate::parser;
use anyhow::{Result, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use tracing::debug;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate — BuiltinCommand and
/// ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The shell front end: owns the environment context, the command factory
/// chain, and the arena that backs each command cycle's memory.
///
/// One cycle runs `read → tokenize → build → dispatch → reset arena`; the
/// arena reset bulk-frees every token and argv string from the cycle.
///
/// Example
/// ```no_run
/// use arsh::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.run("echo", &["hello", "world"]).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
    arena: Arena,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
            arena: Arena::new(),
        }
    }

    /// Default factories over an injected environment context, for tests and
    /// embedders that need deterministic `PATH`/`HOME`.
    pub fn with_env(env: Environment) -> Self {
        Self {
            env,
            ..Self::default()
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's exit code; an unresolved name is reported to
    /// stdout and yields [`NOT_FOUND_EXIT_CODE`].
    pub fn run(&mut self, name: &str, args: &[&str]) -> Result<ExitCode> {
        Self::dispatch(&self.commands, &mut self.env, name, args, &mut std::io::stdout())
    }

    /// Run one full command cycle over `line`, writing builtin output to
    /// stdout.
    pub fn run_line(&mut self, line: &str) -> Result<ExitCode> {
        self.run_line_with_output(line, &mut std::io::stdout())
    }

    /// Same as [`Interpreter::run_line`] with an injectable output stream.
    ///
    /// The arena is reset when the cycle ends, error or not; everything the
    /// cycle allocated is invalid afterwards.
    pub fn run_line_with_output(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
    ) -> Result<ExitCode> {
        let result = self.cycle(line, stdout);
        self.arena.reset();
        result
    }

    /// TOKENIZE → BUILD → DISPATCH for one line.
    fn cycle(&mut self, line: &str, stdout: &mut dyn Write) -> Result<ExitCode> {
        let cmd = parser::build_command(&mut self.arena, Tokenizer::new(line))?;
        if cmd.is_empty() {
            return Ok(0);
        }
        let argv: Vec<&str> = cmd.argv(&self.arena).collect();
        let (name, args) = match argv.split_first() {
            Some(split) => split,
            None => return Ok(0),
        };
        debug!(name, argc = argv.len(), "dispatching command");
        Self::dispatch(&self.commands, &mut self.env, name, args, stdout)
    }

    /// Walk the factory chain; builtins register before the external
    /// launcher, and the first factory that recognizes the name wins.
    fn dispatch(
        commands: &[Box<dyn CommandFactory>],
        env: &mut Environment,
        name: &str,
        args: &[&str],
        stdout: &mut dyn Write,
    ) -> Result<ExitCode> {
        for factory in commands {
            if let Some(cmd) = factory.try_create(env, name, args) {
                return cmd.execute(stdout, env);
            }
        }
        writeln!(stdout, "{}: command not found", name)?;
        Ok(NOT_FOUND_EXIT_CODE)
    }

    /// The interactive Read-Eval-Print Loop.
    ///
    /// Prompts with `"$ "`, runs one cycle per line, and keeps going through
    /// per-cycle errors; only the `exit` builtin or end of input terminates
    /// the session. A missing `PATH` refuses to start the session.
    pub fn repl(&mut self) -> Result<()> {
        if self.env.get_var("PATH").is_none() {
            bail!("PATH is not set");
        }

        let mut rl = DefaultEditor::new()?;
        loop {
            match rl.readline("$ ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if let Err(e) = self.run_line(&line) {
                        eprintln!("{}", e);
                    }
                    if self.env.should_exit {
                        break;
                    }
                    // `line` drops here: the input buffer's lifetime is
                    // independent of the arena reset inside run_line.
                }
                // End of input terminates the shell cleanly, like `exit`.
                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
                Err(err) => bail!(err),
            }
        }
        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `exit`, `echo`, `type`, `pwd`, `cd`
    /// - the external command launcher, last in the chain
    fn default() -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Type>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}
