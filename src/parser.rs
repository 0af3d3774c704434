//! Redirection resolution.
//!
//! Takes the words produced by the [`lexer`](crate::lexer) and separates
//! output redirections (`>`, `1>`, `>>`, `1>>`, `2>`, `2>>`) from the command
//! name and its arguments.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which standard stream a redirection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectStream {
    Stdout,
    Stderr,
}

/// Kind of redirection
///
/// Defines whether the target file is overwritten or extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Output redirection (`>`): **overwrites** the file if it exists.
    Output,
    /// Output redirection with append (`>>`): **appends** to the file if it exists.
    Append,
}

/// Recognizes a redirection operator word.
pub fn redirect_operator(word: &str) -> Option<(RedirectStream, RedirectKind)> {
    match word {
        ">" | "1>" => Some((RedirectStream::Stdout, RedirectKind::Output)),
        ">>" | "1>>" => Some((RedirectStream::Stdout, RedirectKind::Append)),
        "2>" => Some((RedirectStream::Stderr, RedirectKind::Output)),
        "2>>" => Some((RedirectStream::Stderr, RedirectKind::Append)),
        _ => None,
    }
}

/// A file a stream is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    pub path: PathBuf,
    pub append: bool,
}

impl FileTarget {
    /// Opens the target for writing, creating it when it does not exist.
    pub fn open(&self) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(&self.path)
    }
}

/// A command with its redirections separated out.
///
/// `args` never contains a redirection operator or the path that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
    pub stdout: Option<FileTarget>,
    pub stderr: Option<FileTarget>,
}

/// Errors that can occur while resolving redirections.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsingError {
    /// A redirection operator was the last word on the line.
    #[error("syntax error: expected a file name after `{0}`")]
    MissingRedirectTarget(String),
}

struct CommandBuilder {
    words: std::vec::IntoIter<String>,
    argv: Vec<String>,
    stdout: Option<FileTarget>,
    stderr: Option<FileTarget>,
}

impl CommandBuilder {
    fn from(words: Vec<String>) -> Self {
        CommandBuilder {
            words: words.into_iter(),
            argv: Vec::new(),
            stdout: None,
            stderr: None,
        }
    }

    fn build(mut self) -> Result<Option<ParsedCommand>, ParsingError> {
        while let Some(word) = self.words.next() {
            match redirect_operator(&word) {
                Some((stream, kind)) => self.parse_redirect(word, stream, kind)?,
                None => self.argv.push(word),
            }
        }

        let mut argv = self.argv.into_iter();
        Ok(argv.next().map(|name| ParsedCommand {
            name,
            args: argv.collect(),
            stdout: self.stdout,
            stderr: self.stderr,
        }))
    }

    /// Consumes the path after an operator. A later redirection of the same
    /// stream replaces an earlier one.
    fn parse_redirect(
        &mut self,
        operator: String,
        stream: RedirectStream,
        kind: RedirectKind,
    ) -> Result<(), ParsingError> {
        let path = self
            .words
            .next()
            .ok_or(ParsingError::MissingRedirectTarget(operator))?;
        let target = Some(FileTarget {
            path: PathBuf::from(path),
            append: kind == RedirectKind::Append,
        });
        match stream {
            RedirectStream::Stdout => self.stdout = target,
            RedirectStream::Stderr => self.stderr = target,
        }
        Ok(())
    }
}

/// Separates redirections from the command words.
///
/// Returns `Ok(None)` when nothing but redirections (or nothing at all) was
/// given.
pub fn resolve_redirections(words: Vec<String>) -> Result<Option<ParsedCommand>, ParsingError> {
    CommandBuilder::from(words).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::split_into_tokens;

    fn resolve(line: &str) -> Result<Option<ParsedCommand>, ParsingError> {
        resolve_redirections(split_into_tokens(line))
    }

    fn target(path: &str, append: bool) -> Option<FileTarget> {
        Some(FileTarget {
            path: PathBuf::from(path),
            append,
        })
    }

    #[test]
    fn test_no_redirections() {
        let cmd = resolve("ls -la /tmp").unwrap().unwrap();
        assert_eq!(cmd.name, "ls");
        assert_eq!(cmd.args, vec!["-la", "/tmp"]);
        assert_eq!(cmd.stdout, None);
        assert_eq!(cmd.stderr, None);
    }

    #[test]
    fn test_stdout_truncate() {
        let cmd = resolve("echo hi > out.txt").unwrap().unwrap();
        assert_eq!(cmd.name, "echo");
        assert_eq!(cmd.args, vec!["hi"]);
        assert_eq!(cmd.stdout, target("out.txt", false));
        assert_eq!(cmd.stderr, None);
    }

    #[test]
    fn test_all_operators() {
        let cases = [
            (">", false, false),
            ("1>", false, false),
            (">>", false, true),
            ("1>>", false, true),
            ("2>", true, false),
            ("2>>", true, true),
        ];
        for (op, is_stderr, append) in cases {
            let cmd = resolve(&format!("cmd a {op} f b")).unwrap().unwrap();
            assert_eq!(cmd.args, vec!["a", "b"], "operator {op}");
            let (redirected, other) = if is_stderr {
                (cmd.stderr, cmd.stdout)
            } else {
                (cmd.stdout, cmd.stderr)
            };
            assert_eq!(redirected, target("f", append), "operator {op}");
            assert_eq!(other, None, "operator {op}");
        }
    }

    #[test]
    fn test_last_redirection_wins() {
        let cmd = resolve("cmd > a.txt >> b.txt 2> c 2>> d")
            .unwrap()
            .unwrap();
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.stdout, target("b.txt", true));
        assert_eq!(cmd.stderr, target("d", true));
    }

    #[test]
    fn test_redirection_before_command_name() {
        let cmd = resolve("> out.txt echo hi").unwrap().unwrap();
        assert_eq!(cmd.name, "echo");
        assert_eq!(cmd.args, vec!["hi"]);
        assert_eq!(cmd.stdout, target("out.txt", false));
    }

    #[test]
    fn test_missing_target_is_an_error() {
        assert_eq!(
            resolve("echo hi >"),
            Err(ParsingError::MissingRedirectTarget(">".into()))
        );
        assert_eq!(
            resolve("echo hi > a 2>>"),
            Err(ParsingError::MissingRedirectTarget("2>>".into()))
        );
    }

    #[test]
    fn test_only_redirections_yield_no_command() {
        assert_eq!(resolve("> out.txt"), Ok(None));
        assert_eq!(resolve(""), Ok(None));
    }

    #[test]
    fn test_operator_must_be_a_whole_word() {
        let cmd = resolve("echo a>b 3> x").unwrap().unwrap();
        assert_eq!(cmd.args, vec!["a>b", "3>", "x"]);
        assert_eq!(cmd.stdout, None);
    }

    #[test]
    fn test_target_path_keeps_quoted_spaces() {
        let cmd = resolve("echo hi > 'my file.txt'").unwrap().unwrap();
        assert_eq!(cmd.stdout, target("my file.txt", false));
    }

    #[test]
    fn test_open_truncates_or_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "old\n").unwrap();

        let append = FileTarget {
            path: path.clone(),
            append: true,
        };
        io::Write::write_all(&mut append.open().unwrap(), b"new\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nnew\n");

        let truncate = FileTarget {
            path: path.clone(),
            append: false,
        };
        io::Write::write_all(&mut truncate.open().unwrap(), b"fresh\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = FileTarget {
            path: dir.path().join("no/such/dir/out.txt"),
            append: false,
        };
        assert!(target.open().is_err());
    }
}
