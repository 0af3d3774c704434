//! A small interactive command shell.
//!
//! A line of input goes through three stages: the [`lexer`] splits it into
//! words honoring quotes and backslash escapes, the [`parser`] strips output
//! redirections from the word list, and the [`Interpreter`] dispatches the
//! remaining command either to a builtin (`echo`, `type`, `exit`) or to an
//! executable found on `PATH`.
//!
//! The public modules [`command`] and [`env`] expose the traits and types
//! used to implement commands and to inspect the environment the shell runs
//! them in.

mod builtin;
pub mod command;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod repl;

/// Just a convenient re-export of the command dispatcher.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;

pub use error::ShellError;
