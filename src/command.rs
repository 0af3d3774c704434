use crate::env::Environment;
use anyhow::Result;
use std::io::{Read, Write};
use std::process::Stdio;

/// Status a command finishes with; 0 means success.
pub type ExitCode = i32;

/// Input handed to a command.
///
/// Builtins read from it directly; for a child process it is turned into the
/// child's stdin. Anything that is `Read + Into<Stdio>` qualifies; the shell's
/// own stdin implements it by hand and is inherited by children.
pub trait Stdin: Read {
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Read + Into<Stdio>> Stdin for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Output handed to a command, as its stdout or its stderr.
///
/// It is either one of the shell's own streams or a file opened for a
/// redirection. Builtins write to it; an external command receives it as a
/// `Stdio` so the child writes to the same place.
pub trait Stdout: Write {
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Write + Into<Stdio>> Stdout for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// A command ready to run: a builtin with parsed arguments or a resolved
/// executable.
///
/// The streams are owned by the invocation, so a redirection file is closed
/// once `execute` returns, however it returns.
pub trait ExecutableCommand {
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: Box<dyn Stdout>,
        stderr: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// One source of commands the dispatcher consults, in order, for a name.
///
/// `None` means the name is not one of this source's commands and the next
/// source should be asked.
pub trait CommandFactory {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
