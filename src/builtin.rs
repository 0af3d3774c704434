use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::external;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::io::{Read, Write};
use tracing::warn;

/// Built-in commands known to the shell at compile time.
///
/// Builtins build themselves from their words through [`argh::FromArgs`] and run
/// in-process. Their parsers treat every word as an operand; argh's own flag
/// handling (`--help`, `-x`) is never applied to what the user typed.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "type".
    const NAME: &'static str;

    /// Executes the command using provided IO streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        mut stdin: Box<dyn Stdin>,
        mut stdout: Box<dyn Stdout>,
        mut stderr: Box<dyn Stdout>,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let result = BuiltinCommand::execute(*self, &mut stdin, &mut stdout, &mut stderr, env);
        stdout.flush()?;
        match result {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stderr, "{}: {e:#}", T::NAME)?;
                Ok(1)
            }
        }
    }
}

/// Stands in for a builtin whose arguments were rejected by its parser.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdin: Box<dyn Stdin>,
        mut stdout: Box<dyn Stdout>,
        mut stderr: Box<dyn Stdout>,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        if self.is_error {
            writeln!(stderr, "{}", self.output.trim_end())?;
            Ok(1)
        } else {
            writeln!(stdout, "{}", self.output.trim_end())?;
            Ok(0)
        }
    }
}

/// One row of the builtin table.
pub(crate) struct BuiltinEntry {
    pub name: &'static str,
    create: fn(&[&str]) -> Box<dyn ExecutableCommand>,
}

fn create<T: BuiltinCommand + 'static>(args: &[&str]) -> Box<dyn ExecutableCommand> {
    match T::from_args(&[T::NAME], args) {
        Ok(cmd) => Box::new(cmd),
        Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
            output,
            is_error: status.is_err(),
        }),
    }
}

static BUILTINS: [BuiltinEntry; 3] = [
    BuiltinEntry {
        name: Echo::NAME,
        create: create::<Echo>,
    },
    BuiltinEntry {
        name: Exit::NAME,
        create: create::<Exit>,
    },
    BuiltinEntry {
        name: Type::NAME,
        create: create::<Type>,
    },
];

/// Finds the builtin called exactly `name`.
pub(crate) fn lookup(name: &str) -> Option<&'static BuiltinEntry> {
    BUILTINS.iter().find(|entry| entry.name == name)
}

pub(crate) fn is_builtin(name: &str) -> bool {
    lookup(name).is_some()
}

/// Command factory over the fixed builtin table.
pub(crate) struct BuiltinRegistry;

impl CommandFactory for BuiltinRegistry {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        lookup(name).map(|entry| (entry.create)(args))
    }
}

/// Usage failure reported by a builtin's argument parser.
fn usage_error(name: &str, message: &str) -> EarlyExit {
    EarlyExit {
        output: format!("{name}: {message}"),
        status: Err(()),
    }
}

/// Takes the single optional operand of a builtin. Every word is an operand,
/// so `help`, `--help` and `-1` reach the command unchanged.
fn optional_operand(name: &str, args: &[&str]) -> Result<Option<String>, EarlyExit> {
    match args {
        [] => Ok(None),
        [arg] => Ok(Some(arg.to_string())),
        _ => Err(usage_error(name, "too many arguments")),
    }
}

/// Write the arguments to standard output, separated by spaces and followed
/// by a newline.
///
/// Every argument is printed as given, including ones that look like flags.
pub struct Echo {
    pub args: Vec<String>,
}

impl FromArgs for Echo {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        if args.is_empty() {
            return Err(usage_error(Self::NAME, "requires an argument"));
        }
        Ok(Echo {
            args: args.iter().map(|arg| arg.to_string()).collect(),
        })
    }
}

impl BuiltinCommand for Echo {
    const NAME: &'static str = "echo";

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.args.join(" "))?;
        Ok(0)
    }
}

/// Exit the shell with the given status, 0 when omitted.
pub struct Exit {
    pub code: Option<String>,
}

impl FromArgs for Exit {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Exit {
            code: optional_operand(Self::NAME, args)?,
        })
    }
}

impl BuiltinCommand for Exit {
    const NAME: &'static str = "exit";

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let code = match self.code {
            None => 0,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(argument = %raw, "exit: non-numeric status, using 0");
                0
            }),
        };
        env.request_exit(code);
        Ok(code)
    }
}

/// Display how a name would be interpreted if used as a command.
pub struct Type {
    pub name: String,
}

impl FromArgs for Type {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        match optional_operand(Self::NAME, args)? {
            Some(name) => Ok(Type { name }),
            None => Err(usage_error(Self::NAME, "requires an argument")),
        }
    }
}

impl BuiltinCommand for Type {
    const NAME: &'static str = "type";

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        if is_builtin(&self.name) {
            writeln!(stdout, "{} is a shell builtin", self.name)?;
            return Ok(0);
        }
        match external::lookup(env, &self.name) {
            Some(path) => {
                writeln!(stdout, "{} is {}", self.name, path.display())?;
                Ok(0)
            }
            None => {
                writeln!(stdout, "{}: not found", self.name)?;
                Ok(1)
            }
        }
    }
}
