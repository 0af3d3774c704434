//! Error types for the shell

use crate::parser::ParsingError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors the shell reports while handling one input line.
///
/// Only [`ShellError::Input`] ends the read loop; everything else is printed
/// and the shell prompts again.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Malformed redirection
    #[error(transparent)]
    Parse(#[from] ParsingError),

    /// A redirection target could not be created or opened
    #[error("{}: {source}", .path.display())]
    RedirectOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Neither a builtin nor an executable on PATH
    #[error("{0}: command not found")]
    CommandNotFound(String),

    /// The executable was found but the child process could not be created
    #[error("{name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Reading the next line failed
    #[error("error reading input: {0}")]
    Input(String),

    /// Any other failure while running a command
    #[error(transparent)]
    Command(#[from] anyhow::Error),
}

impl ShellError {
    /// Status reported for a line that failed with this error.
    pub fn status(&self) -> i32 {
        match self {
            ShellError::Parse(_) => 2,
            ShellError::CommandNotFound(_) => 127,
            ShellError::Spawn { .. } => 126,
            ShellError::RedirectOpen { .. } | ShellError::Input(_) | ShellError::Command(_) => 1,
        }
    }
}
