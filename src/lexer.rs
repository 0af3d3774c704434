//! Lexical analysis of a single input line.
//!
//! The lexer turns a raw line into the list of words a command receives.
//! Quotes and backslashes are resolved here, so later stages only ever see
//! plain strings.

use tracing::debug;

/// Quoting context the lexer is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    /// Outside of any quotes.
    Normal,
    /// Between a pair of `'`.
    SingleQuoted,
    /// Between a pair of `"`.
    DoubleQuoted,
}

impl LexingState {
    /// Whether a backslash escapes `ch` in this context.
    ///
    /// Outside quotes a backslash escapes anything. Inside double quotes it
    /// only escapes `"` and `\`, otherwise both characters are kept. Single
    /// quotes have no escapes at all.
    fn escapes(self, ch: char) -> bool {
        match self {
            LexingState::Normal => true,
            LexingState::DoubleQuoted => matches!(ch, '"' | '\\'),
            LexingState::SingleQuoted => false,
        }
    }
}

struct LexingFSM {
    state: LexingState,
    escaped: bool,
    buffer: String,
    out: Vec<String>,
}

impl LexingFSM {
    fn new() -> Self {
        LexingFSM {
            state: LexingState::Normal,
            escaped: false,
            buffer: String::new(),
            out: Vec::new(),
        }
    }

    /// Runs the state machine over `line` and returns the collected words.
    fn make_tokens(mut self, line: &str) -> Vec<String> {
        for ch in line.chars() {
            if self.escaped {
                self.escaped = false;
                self.handle_escaped(ch);
                continue;
            }
            match self.state {
                LexingState::Normal => self.handle_normal(ch),
                LexingState::SingleQuoted => self.handle_single_quote(ch),
                LexingState::DoubleQuoted => self.handle_double_quote(ch),
            }
        }

        if self.escaped && self.state == LexingState::DoubleQuoted {
            self.buffer.push('\\');
        }
        if self.state != LexingState::Normal {
            debug!(state = ?self.state, "closing unterminated quote at end of line");
        }
        self.finish_word();
        self.out
    }

    fn handle_escaped(&mut self, ch: char) {
        if !self.state.escapes(ch) {
            self.buffer.push('\\');
        }
        self.buffer.push(ch);
    }

    fn handle_normal(&mut self, ch: char) {
        match ch {
            c if c.is_whitespace() => self.finish_word(),
            '\'' => self.state = LexingState::SingleQuoted,
            '"' => self.state = LexingState::DoubleQuoted,
            '\\' => self.escaped = true,
            c => self.buffer.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::Normal,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::Normal,
            '\\' => self.escaped = true,
            c => self.buffer.push(c),
        }
    }

    /// Emits the pending word. Empty words are never emitted.
    fn finish_word(&mut self) {
        if !self.buffer.is_empty() {
            self.out.push(std::mem::take(&mut self.buffer));
        }
    }
}

/// Splits a line into words.
///
/// Whitespace separates words unless it is quoted or escaped. Adjacent
/// quoted and unquoted pieces join into one word, so `'ab'"cd"` is `abcd`.
/// An unterminated quote is closed at the end of the line.
///
/// ```
/// use tinysh::lexer::split_into_tokens;
/// assert_eq!(split_into_tokens(r"echo 'a  b' c\ d"), ["echo", "a  b", "c d"]);
/// ```
pub fn split_into_tokens(line: &str) -> Vec<String> {
    LexingFSM::new().make_tokens(line)
}
