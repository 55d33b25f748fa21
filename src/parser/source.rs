//! Character input and source line retention
//!
//! [`CharStream`] pulls characters from any [`BufRead`] one line at a time, so
//! an interactive session never blocks waiting for input past the newline it
//! is currently lexing. Every consumed character is also recorded in a
//! [`SourceBuffer`], which diagnostics use to print the offending line.

use super::ast::SourceLocation;
use std::io::{BufRead, Cursor};
use tracing::warn;

/// Lines of source consumed so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBuffer {
    completed: Vec<String>,
    current: String,
}

impl SourceBuffer {
    pub fn new() -> Self {
        SourceBuffer::default()
    }

    /// Record one consumed character; `'\n'` closes the current line
    pub fn push(&mut self, ch: char) {
        if ch == '\n' {
            self.completed.push(std::mem::take(&mut self.current));
        } else {
            self.current.push(ch);
        }
    }

    /// Text of 1-based line `n`, if it has been (at least partly) consumed
    pub fn line(&self, n: usize) -> Option<&str> {
        if n == 0 {
            return None;
        }
        if n <= self.completed.len() {
            Some(&self.completed[n - 1])
        } else if n == self.completed.len() + 1 {
            Some(&self.current)
        } else {
            None
        }
    }

    /// 1-based number of the line currently being consumed
    pub fn current_line_number(&self) -> usize {
        self.completed.len() + 1
    }

    pub fn clear(&mut self) {
        self.completed.clear();
        self.current.clear();
    }
}

/// Lazily-filled character stream with location tracking
///
/// The moving location starts at line 1, column 0 and names the last consumed
/// character; consuming `'\n'` moves to the next line at column 0. `"\r\n"`
/// and a lone `'\r'` are both delivered as a single `'\n'`.
pub struct CharStream {
    reader: Box<dyn BufRead>,
    pending: Vec<char>,
    position: usize,
    exhausted: bool,
    location: SourceLocation,
    source: SourceBuffer,
}

impl CharStream {
    pub fn new(reader: impl BufRead + 'static) -> Self {
        CharStream {
            reader: Box::new(reader),
            pending: Vec::new(),
            position: 0,
            exhausted: false,
            location: SourceLocation::new(1, 0),
            source: SourceBuffer::new(),
        }
    }

    /// Stream over an in-memory string
    pub fn from_source(source: &str) -> Self {
        CharStream::new(Cursor::new(source.to_string().into_bytes()))
    }

    /// Make sure at least one unconsumed character is buffered.
    /// Returns false at end of input.
    fn fill(&mut self) -> bool {
        if self.position < self.pending.len() {
            return true;
        }
        if self.exhausted {
            return false;
        }

        self.pending.clear();
        self.position = 0;
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => {
                self.exhausted = true;
                false
            }
            Ok(_) => {
                self.pending.extend(line.chars());
                true
            }
            Err(err) => {
                warn!(error = %err, "read failed, treating as end of input");
                self.exhausted = true;
                false
            }
        }
    }

    /// Next character without consuming it
    pub fn peek(&mut self) -> Option<char> {
        if !self.fill() {
            return None;
        }
        match self.pending[self.position] {
            '\r' => Some('\n'),
            ch => Some(ch),
        }
    }

    /// Character after the next one, looking only at already-buffered input
    pub fn peek_second(&self) -> Option<char> {
        self.pending.get(self.position + 1).copied()
    }

    /// Consume one character
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let raw = self.pending[self.position];
        self.position += 1;
        if raw == '\r' && self.pending.get(self.position) == Some(&'\n') {
            self.position += 1;
        }

        if ch == '\n' {
            self.location.line += 1;
            self.location.column = 0;
        } else {
            self.location.column += 1;
        }
        self.source.push(ch);
        Some(ch)
    }

    /// Moving location (line of the next character, column of the last one)
    pub fn location(&self) -> SourceLocation {
        self.location
    }

    pub fn source(&self) -> &SourceBuffer {
        &self.source
    }

    /// Full text of line `n`: consumed lines verbatim, and for the line in
    /// progress its consumed prefix plus the buffered rest of that line
    pub fn line_text(&self, n: usize) -> Option<String> {
        let consumed = self.source.line(n)?;
        if n < self.source.current_line_number() {
            return Some(consumed.to_string());
        }
        let rest: String = self.pending[self.position.min(self.pending.len())..]
            .iter()
            .take_while(|&&c| c != '\n' && c != '\r')
            .collect();
        Some(format!("{consumed}{rest}"))
    }
}
