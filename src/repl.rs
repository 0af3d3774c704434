//! Where input lines come from.
//!
//! On a terminal lines are read with [`rustyline`]; otherwise (pipes, files,
//! tests) a plain buffered reader is used and the prompt is written by hand.

use crate::error::ShellError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};

/// A source of input lines for [`Interpreter::repl`](crate::Interpreter::repl).
pub trait LineSource {
    /// Shows `prompt` and reads one line without its terminator.
    ///
    /// Returns `Ok(None)` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError>;
}

/// Line editor input for interactive terminals.
///
/// No history entries are recorded and no completion is offered.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub fn new() -> Result<Self, ShellError> {
        let editor = DefaultEditor::new().map_err(|err| ShellError::Input(err.to_string()))?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            // Ctrl-C drops the line being edited.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(ShellError::Input(err.to_string())),
        }
    }
}

/// Reads lines from any buffered reader, writing the prompt to `prompt_out`.
pub struct PlainSource<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> PlainSource<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineSource for PlainSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        write!(self.prompt_out, "{prompt}")
            .and_then(|()| self.prompt_out.flush())
            .map_err(|err| ShellError::Input(err.to_string()))?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed);
                Ok(Some(line))
            }
            Err(err) => Err(ShellError::Input(err.to_string())),
        }
    }
}
