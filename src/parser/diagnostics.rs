//! Error reporting
//!
//! A [`Diagnostic`] is rendered as a header, the offending source line, and a
//! caret under the reported column:
//!
//! ```text
//! Error (Line 3, Column 9): Expected ':' after if condition, found newline
//!     if x > 1
//!         ^~~~
//! ```
//!
//! The [`Emitter`] writes rendered diagnostics to stderr (or to a buffer in
//! tests) and keeps every emitted diagnostic for later inspection.

use super::ast::SourceLocation;
use super::lexer::TokenKind;
use super::source::CharStream;
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexical,
    Syntax,
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Error (Line {}, Column {}): {message}", location.line, location.column)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            location,
        }
    }

    pub fn lexical(message: impl Into<String>, location: SourceLocation) -> Self {
        Diagnostic::new(DiagnosticKind::Lexical, message, location)
    }

    pub fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        Diagnostic::new(DiagnosticKind::Syntax, message, location)
    }

    pub fn semantic(message: impl Into<String>, location: SourceLocation) -> Self {
        Diagnostic::new(DiagnosticKind::Semantic, message, location)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::Number(n) => write!(f, "number '{}'", n.text),
            TokenKind::Eol => write!(f, "newline"),
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Indent => write!(f, "indent"),
            TokenKind::Dedent => write!(f, "dedent"),
            TokenKind::Error => write!(f, "invalid token"),
            other => match other.spelling() {
                Some(text) => write!(f, "'{}'", text),
                None => write!(f, "{:?}", other),
            },
        }
    }
}

/// Where an error "at" this token should point.
///
/// An `Eol` token is located at the start of the following line; errors
/// about it point just past the end of the line it terminates instead.
pub fn anchor_location(
    location: SourceLocation,
    kind: &TokenKind,
    stream: &CharStream,
) -> SourceLocation {
    if *kind != TokenKind::Eol || location.line < 2 {
        return location;
    }
    let line = location.line - 1;
    match stream.line_text(line) {
        Some(text) => SourceLocation::new(line, text.chars().count() + 1),
        None => location,
    }
}

/// Header, source line, and caret; the header alone if the line is unknown
pub fn render(diagnostic: &Diagnostic, stream: &CharStream) -> String {
    let mut out = format!("{}\n", diagnostic);
    if let Some(line) = stream.line_text(diagnostic.location.line) {
        out.push_str(&line);
        out.push('\n');
        out.push_str(&" ".repeat(diagnostic.location.column.saturating_sub(1)));
        out.push_str("^~~~\n");
    }
    out
}

enum Sink {
    Stderr,
    Buffer(String),
}

/// Diagnostic output sink
pub struct Emitter {
    sink: Sink,
    emitted: Vec<Diagnostic>,
}

impl Emitter {
    pub fn stderr() -> Self {
        Emitter {
            sink: Sink::Stderr,
            emitted: Vec::new(),
        }
    }

    /// Collects output in memory instead of writing it
    pub fn buffered() -> Self {
        Emitter {
            sink: Sink::Buffer(String::new()),
            emitted: Vec::new(),
        }
    }

    pub fn emit(&mut self, diagnostic: Diagnostic, stream: &CharStream) {
        tracing::debug!(
            kind = ?diagnostic.kind,
            line = diagnostic.location.line,
            column = diagnostic.location.column,
            "emitting diagnostic"
        );
        let text = render(&diagnostic, stream);
        self.write(&text);
        self.emitted.push(diagnostic);
    }

    /// Raw text on the diagnostic channel (used for the interactive prompt)
    pub fn write(&mut self, text: &str) {
        match &mut self.sink {
            Sink::Stderr => {
                let mut stderr = std::io::stderr().lock();
                let _ = stderr.write_all(text.as_bytes());
                let _ = stderr.flush();
            }
            Sink::Buffer(buffer) => buffer.push_str(text),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.emitted
    }

    pub fn error_count(&self) -> usize {
        self.emitted.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.emitted.is_empty()
    }

    /// Everything written so far; empty when writing to stderr
    pub fn output(&self) -> &str {
        match &self.sink {
            Sink::Stderr => "",
            Sink::Buffer(buffer) => buffer,
        }
    }
}
