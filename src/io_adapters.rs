use crate::command::{Stdin, Stdout};
use std::cell::RefCell;
use std::io::{self, Read, Result as IoResult, Write};
use std::process::Stdio;
use std::rc::Rc;

/// Source of the streams a command gets when it is not redirected.
///
/// Every call hands out a fresh handle, so a command can own its streams and
/// the shell still has its own handle for reporting errors.
pub trait OutputStreams {
    fn stdout(&self) -> Box<dyn Stdout>;
    fn stderr(&self) -> Box<dyn Stdout>;
}

/// The shell process's own standard output and standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessStreams;

impl OutputStreams for ProcessStreams {
    fn stdout(&self) -> Box<dyn Stdout> {
        Box::new(io::stdout())
    }

    fn stderr(&self) -> Box<dyn Stdout> {
        Box::new(io::stderr())
    }
}

/// Standard input of the shell process, passed through to commands.
///
/// Locks stdin only for the duration of a read.
pub struct InheritedStdin(pub io::Stdin);

impl Read for InheritedStdin {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        self.0.read(buf)
    }
}

impl Stdin for InheritedStdin {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::inherit()
    }
}

/// Memory-backed writer for capturing output from builtins.
///
/// Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    /// Public constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl Stdout for MemWriter {
    /// External processes cannot write into memory; their output is discarded.
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::null()
    }
}

/// In-memory stdout and stderr, for tests and embedding.
#[derive(Clone, Default)]
pub struct CapturedStreams {
    pub stdout: MemWriter,
    pub stderr: MemWriter,
}

impl CapturedStreams {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputStreams for CapturedStreams {
    fn stdout(&self) -> Box<dyn Stdout> {
        Box::new(self.stdout.clone())
    }

    fn stderr(&self) -> Box<dyn Stdout> {
        Box::new(self.stderr.clone())
    }
}
