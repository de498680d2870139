//! An interactive mini-shell front end with arena-backed per-command memory.
//!
//! The crate is organized leaf to root: [`arena`] supplies all per-cycle
//! memory, [`lexer`] turns a raw line into quote-aware word tokens,
//! [`parser`] materializes the tokens into an arena-backed argument vector,
//! and the executor ([`Interpreter`] plus the builtin and external command
//! modules) resolves `argv[0]` against the builtin registry or `PATH` and
//! drives process creation.
//!
//! The main entry point is [`Interpreter`]; the [`command`] and [`env`]
//! modules expose the traits and the environment context for implementing
//! custom commands and for deterministic testing.

pub mod arena;
mod builtin;
pub mod command;
pub mod env;
mod external;
mod interpreter;
pub mod lexer;
pub mod parser;

pub use arena::Arena;
pub use env::Environment;
pub use interpreter::Interpreter;
