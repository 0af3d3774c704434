use crate::builtin::BuiltinRegistry;
use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdout};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::PathExecutor;
use crate::io_adapters::{InheritedStdin, OutputStreams, ProcessStreams};
use crate::lexer;
use crate::parser::{self, FileTarget};
use crate::repl::LineSource;
use anyhow::Context;
use std::io::{self, Write};
use tracing::debug;

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter maintains an [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried in order to create commands by name. See [`Default`] for the
/// factories included out of the box.
///
/// Example
/// ```
/// use tinysh::Interpreter;
/// use tinysh::io_adapters::CapturedStreams;
///
/// let streams = CapturedStreams::new();
/// let mut sh = Interpreter::with_streams(streams.clone());
/// let code = sh.execute_line("echo 'hello   world'");
/// assert_eq!(code, 0);
/// assert_eq!(streams.stdout.contents(), "hello   world\n");
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
    streams: Box<dyn OutputStreams>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>, streams: Box<dyn OutputStreams>) -> Self {
        Self {
            env: Environment::new(),
            commands,
            streams,
        }
    }

    /// Create an interpreter with the default commands writing to `streams`.
    pub fn with_streams(streams: impl OutputStreams + 'static) -> Self {
        Self::new(default_commands(), Box::new(streams))
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Run a single command invocation by name with arguments, using the
    /// shell's own output streams.
    ///
    /// An unknown name is reported on stderr and yields status 127.
    pub fn run(&mut self, name: &str, args: &[&str]) -> Result<ExitCode, ShellError> {
        let stdout = self.streams.stdout();
        let stderr = self.streams.stderr();
        self.run_with(name, args, stdout, stderr)
    }

    /// Tokenize, resolve redirections and run one input line.
    ///
    /// Errors are reported on stderr and turned into a status; nothing here
    /// ends the shell. The shell's stdout is flushed before returning.
    pub fn execute_line(&mut self, line: &str) -> ExitCode {
        let code = match self.try_execute_line(line) {
            Ok(code) => code,
            Err(err) => {
                self.report(&err);
                err.status()
            }
        };
        // Nowhere left to report a failed flush of our own stdout.
        let _ = self.streams.stdout().flush();
        code
    }

    /// Reads and executes lines until `exit`, end of input or a read error.
    ///
    /// Returns the status the shell process should exit with.
    pub fn repl(&mut self, source: &mut dyn LineSource, prompt: &str) -> ExitCode {
        loop {
            match source.read_line(prompt) {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.execute_line(&line);
                    if let Some(code) = self.env.exit_request.take() {
                        return code;
                    }
                }
                Ok(None) => return 0,
                Err(err) => {
                    self.report(&err);
                    return 1;
                }
            }
        }
    }

    fn try_execute_line(&mut self, line: &str) -> Result<ExitCode, ShellError> {
        let words = lexer::split_into_tokens(line);
        debug!(?words, "tokenized line");
        let Some(parsed) = parser::resolve_redirections(words)? else {
            return Ok(0);
        };
        debug!(?parsed, "resolved command");

        let stdout = self.open_stream(parsed.stdout.as_ref(), || self.streams.stdout())?;
        let stderr = self.open_stream(parsed.stderr.as_ref(), || self.streams.stderr())?;
        let args: Vec<&str> = parsed.args.iter().map(String::as_str).collect();
        self.run_with(&parsed.name, &args, stdout, stderr)
    }

    /// Opens a redirection target, or falls back to the shell's own stream.
    fn open_stream(
        &self,
        target: Option<&FileTarget>,
        inherited: impl FnOnce() -> Box<dyn Stdout>,
    ) -> Result<Box<dyn Stdout>, ShellError> {
        match target {
            Some(target) => match target.open() {
                Ok(file) => Ok(Box::new(file)),
                Err(source) => Err(ShellError::RedirectOpen {
                    path: target.path.clone(),
                    source,
                }),
            },
            None => Ok(inherited()),
        }
    }

    fn run_with(
        &mut self,
        name: &str,
        args: &[&str],
        stdout: Box<dyn Stdout>,
        mut stderr: Box<dyn Stdout>,
    ) -> Result<ExitCode, ShellError> {
        let Some(cmd) = self.create(name, args) else {
            let err = ShellError::CommandNotFound(name.to_string());
            writeln!(stderr, "{err}").context("writing to stderr")?;
            return Ok(err.status());
        };
        let stdin = Box::new(InheritedStdin(io::stdin()));
        cmd.execute(stdin, stdout, stderr, &mut self.env)
            .map_err(|e| match e.downcast::<ShellError>() {
                Ok(err) => err,
                Err(e) => ShellError::Command(e),
            })
    }

    fn create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(&self.env, name, args))
    }

    fn report(&self, err: &ShellError) {
        let mut stderr = self.streams.stderr();
        let _ = writeln!(stderr, "{err:#}");
    }
}

fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    vec![Box::new(BuiltinRegistry), Box::new(PathExecutor)]
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands writing to the
    /// process's stdout and stderr:
    /// - built-ins: `echo`, `exit`, `type`
    /// - external command launcher
    fn default() -> Self {
        Self::with_streams(ProcessStreams)
    }
}
