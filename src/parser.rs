//! Command builder: token stream into an arena-backed argument vector.

use crate::arena::{Arena, ArenaError, ArenaStr};
use crate::lexer::{LexError, Token};
use thiserror::Error;

/// Initial argv capacity; doubled on demand.
pub const DEFAULT_ARGV_CAPACITY: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("syntax error: {0}")]
    Syntax(#[from] LexError),
    #[error("out of command memory: {0}")]
    Alloc(#[from] ArenaError),
}

/// The parsed argument vector for one command cycle.
///
/// Entries are handles to arena-owned, NUL-terminated copies of the token
/// texts; they share the arena's lifetime and are never freed individually.
/// The command never survives the arena reset at the end of its cycle.
#[derive(Debug)]
pub struct Command {
    argv: Vec<ArenaStr>,
    cap: usize,
}

impl Command {
    fn new() -> Self {
        Self {
            argv: Vec::with_capacity(DEFAULT_ARGV_CAPACITY),
            cap: DEFAULT_ARGV_CAPACITY,
        }
    }

    /// Append one argument, growing the table when the append would leave no
    /// spare slot for the terminator position.
    fn push(&mut self, arg: ArenaStr) {
        if self.argv.len() + 1 >= self.cap {
            self.cap *= 2;
            self.argv.reserve(self.cap - self.argv.len());
        }
        self.argv.push(arg);
    }

    pub fn len(&self) -> usize {
        self.argv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    /// Current argv table capacity, terminator slot included.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Resolve the argument texts against the arena that owns them.
    pub fn argv<'a>(&'a self, arena: &'a Arena) -> impl Iterator<Item = &'a str> {
        self.argv.iter().map(|s| arena.str(*s))
    }

    /// `argv[0]`, if any.
    pub fn name<'a>(&self, arena: &'a Arena) -> Option<&'a str> {
        self.argv.first().map(|s| arena.str(*s))
    }
}

/// Materialize a token stream into a [`Command`].
///
/// Each token's text is duplicated into arena memory; the builder never
/// aliases tokenizer-internal buffers. The stream is consumed exactly once;
/// a lexer or arena error aborts the build and the partial command is
/// discarded with the cycle's arena reset.
pub fn build_command<I>(arena: &mut Arena, tokens: I) -> Result<Command, BuildError>
where
    I: IntoIterator<Item = Result<Token, LexError>>,
{
    let mut cmd = Command::new();
    for token in tokens {
        let token = token?;
        let arg = arena.alloc_str(&token.text)?;
        cmd.push(arg);
    }
    Ok(cmd)
}
