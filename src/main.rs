use argh::FromArgs;
use std::io::{self, IsTerminal};
use tinysh::Interpreter;
use tinysh::command::ExitCode;
use tinysh::logging;
use tinysh::repl::{EditorSource, PlainSource};
use tracing::warn;

#[derive(FromArgs)]
/// A small interactive command shell.
struct Args {
    #[argh(option, short = 'c')]
    /// run one command line and exit with its status.
    command: Option<String>,

    #[argh(option, default = "String::from(\"$ \")")]
    /// prompt printed before each line.
    prompt: String,

    #[argh(switch)]
    /// read plain lines even when stdin is a terminal.
    plain: bool,
}

fn main() {
    let args: Args = argh::from_env();
    logging::init_stderr_logging();

    let mut shell = Interpreter::default();
    let code = match &args.command {
        Some(line) => {
            let code = shell.execute_line(line);
            shell.env_mut().exit_request.take().unwrap_or(code)
        }
        None => run_interactive(&mut shell, &args),
    };
    std::process::exit(code)
}

fn run_interactive(shell: &mut Interpreter, args: &Args) -> ExitCode {
    if !args.plain && io::stdin().is_terminal() {
        match EditorSource::new() {
            Ok(mut source) => return shell.repl(&mut source, &args.prompt),
            Err(err) => warn!(%err, "line editor unavailable, reading plain lines"),
        }
    }
    let mut source = PlainSource::new(io::stdin().lock(), io::stdout());
    shell.repl(&mut source, &args.prompt)
}
