//! Lexer (tokenizer) for Pyxc source
//!
//! Converts a [`CharStream`] into [`Token`]s on demand. Besides ordinary tokens
//! the lexer synthesizes layout tokens from leading whitespace: `Indent` when a
//! line is indented deeper than the enclosing block, one `Dedent` per closed
//! block, and `Eol` at each logical line end. Blank and comment-only lines never
//! reach the indentation stack.
//!
//! Lexical errors produce an [`TokenKind::Error`] token; the matching
//! [`Diagnostic`] waits in the lexer until the parser takes it.

use super::ast::{NumberValue, SourceLocation};
use super::diagnostics::{Diagnostic, Emitter};
use super::source::CharStream;
use std::io::BufRead;
use tracing::{debug, trace};

/// Column width a tab advances to
pub const TAB_WIDTH: usize = 8;

/// Number literal: source spelling plus parsed value
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub text: String,
    pub value: NumberValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Layout
    Eof,
    Eol,
    Indent,
    Dedent,
    Error,

    // Literals and names
    Identifier(String),
    Number(NumberLiteral),

    // Keywords
    Def,
    Extern,
    Return,
    If,
    Elif,
    Else,
    For,
    In,
    Range,
    While,
    Do,
    Break,
    Continue,
    Print,
    Type,
    Struct,
    Match,
    Case,
    Not,
    And,
    Or,

    // Operators
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %
    EqEq,    // ==
    NotEq,   // !=
    Lt,      // <
    Le,      // <=
    Gt,      // >
    Ge,      // >=
    Assign,  // =
    Bang,    // !
    Amp,     // &
    Pipe,    // |
    Caret,   // ^
    Tilde,   // ~
    Arrow,   // ->

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Colon,    // :
    Dot,      // .
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "def" => TokenKind::Def,
            "extern" => TokenKind::Extern,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "range" => TokenKind::Range,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "print" => TokenKind::Print,
            "type" => TokenKind::Type,
            "struct" => TokenKind::Struct,
            "match" => TokenKind::Match,
            "case" => TokenKind::Case,
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            _ => return None,
        };
        Some(kind)
    }

    /// Source spelling of keywords and operators
    pub fn spelling(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Def => "def",
            TokenKind::Extern => "extern",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::Range => "range",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Print => "print",
            TokenKind::Type => "type",
            TokenKind::Struct => "struct",
            TokenKind::Match => "match",
            TokenKind::Case => "case",
            TokenKind::Not => "not",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::Assign => "=",
            TokenKind::Bang => "!",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Arrow => "->",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Eof
            | TokenKind::Eol
            | TokenKind::Indent
            | TokenKind::Dedent
            | TokenKind::Error
            | TokenKind::Identifier(_)
            | TokenKind::Number(_) => return None,
        };
        Some(text)
    }

    pub fn is_keyword(&self) -> bool {
        self.spelling().and_then(TokenKind::keyword).is_some()
    }

    /// Short name used by the token dump (`<def>`, `<identifier>`, ...)
    pub fn dump_name(&self) -> String {
        match self {
            TokenKind::Eof => "eof".to_string(),
            TokenKind::Eol => "eol".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            TokenKind::Error => "error".to_string(),
            TokenKind::Identifier(_) => "identifier".to_string(),
            TokenKind::Number(_) => "number".to_string(),
            other => other.spelling().unwrap_or("?").to_string(),
        }
    }
}

/// A token and the location of its first character
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        Token { kind, location }
    }
}

/// Streaming lexer with an indentation stack
pub struct Lexer {
    stream: CharStream,
    /// Open indentation widths; the bottom entry is always 0
    indents: Vec<usize>,
    pending_dedents: usize,
    at_line_start: bool,
    last_indent_width: usize,
    error: Option<Diagnostic>,
}

impl Lexer {
    pub fn new(stream: CharStream) -> Self {
        Lexer {
            stream,
            indents: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            last_indent_width: 0,
            error: None,
        }
    }

    pub fn from_source(source: &str) -> Self {
        Lexer::new(CharStream::from_source(source))
    }

    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        Lexer::new(CharStream::new(reader))
    }

    pub fn stream(&self) -> &CharStream {
        &self.stream
    }

    /// Take the diagnostic behind the most recent `Error` token
    pub fn take_error(&mut self) -> Option<Diagnostic> {
        self.error.take()
    }

    /// Number of open indented blocks
    pub fn indent_depth(&self) -> usize {
        self.indents.len() - 1
    }

    /// Width of the most recently opened indentation level
    pub fn last_indent_width(&self) -> usize {
        self.last_indent_width
    }

    /// Lex everything up to and including `Eof`
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Render the remaining tokens in the dump format, one source line per
    /// output line: `<def> <identifier> <(> ... <eol>`. Each lexical error is
    /// emitted as its `Error` token is reached.
    pub fn render_tokens(&mut self, emitter: &mut Emitter) -> String {
        let mut out = String::new();
        let mut line_open = false;
        loop {
            let token = self.next_token();
            if token.kind == TokenKind::Error {
                if let Some(diagnostic) = self.take_error() {
                    emitter.emit(diagnostic, &self.stream);
                }
            }
            if line_open {
                out.push(' ');
            }
            match &token.kind {
                TokenKind::Indent => {
                    out.push_str(&format!("<indent={}>", self.last_indent_width))
                }
                kind => out.push_str(&format!("<{}>", kind.dump_name())),
            }
            line_open = true;
            match token.kind {
                TokenKind::Eol => {
                    out.push('\n');
                    line_open = false;
                }
                TokenKind::Eof => {
                    out.push('\n');
                    break;
                }
                _ => {}
            }
        }
        out
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.lex();
        trace!(
            kind = ?token.kind,
            line = token.location.line,
            column = token.location.column,
            "token"
        );
        token
    }

    fn lex(&mut self) -> Token {
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            return Token::new(TokenKind::Dedent, self.location_here());
        }

        if self.at_line_start {
            if let Some(token) = self.start_line() {
                return token;
            }
        }

        self.skip_horizontal_whitespace();
        let loc = self.location_here();
        let Some(ch) = self.stream.peek() else {
            return self.end_of_input(loc);
        };

        match ch {
            '\n' => {
                self.stream.advance();
                self.end_of_line()
            }
            '#' => {
                if self.skip_comment() {
                    self.end_of_line()
                } else {
                    self.end_of_input(loc)
                }
            }
            '\'' => {
                self.stream.advance();
                self.char_literal(loc)
            }
            c if c.is_ascii_digit() => self.number_literal(loc),
            '.' if self.stream.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(loc)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                self.identifier_or_keyword(loc)
            }
            _ => {
                self.stream.advance();
                self.operator(ch, loc)
            }
        }
    }

    /// Measure leading whitespace of a new line and turn it into layout
    /// tokens. Returns None when the line needs no layout token.
    fn start_line(&mut self) -> Option<Token> {
        loop {
            let (width, mixed) = self.leading_whitespace();
            match self.stream.peek() {
                Some('\n') => {
                    self.stream.advance();
                    continue;
                }
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                None => return None,
                Some(_) => {}
            }

            self.at_line_start = false;
            let loc = self.location_here();
            if mixed {
                return Some(self.error(
                    loc,
                    "You cannot mix tabs and spaces in indentation".to_string(),
                ));
            }
            return self.resolve_indent(width, loc);
        }
    }

    fn leading_whitespace(&mut self) -> (usize, bool) {
        let mut width = 0;
        let mut spaces = false;
        let mut tabs = false;
        while let Some(ch) = self.stream.peek() {
            match ch {
                ' ' => {
                    width += 1;
                    spaces = true;
                }
                '\t' => {
                    width += TAB_WIDTH - width % TAB_WIDTH;
                    tabs = true;
                }
                _ => break,
            }
            self.stream.advance();
        }
        (width, spaces && tabs)
    }

    fn resolve_indent(&mut self, width: usize, loc: SourceLocation) -> Option<Token> {
        let top = self.current_indent();
        if width > top {
            self.indents.push(width);
            self.last_indent_width = width;
            debug!(width, depth = self.indent_depth(), "indent");
            return Some(Token::new(TokenKind::Indent, loc));
        }
        if width == top {
            return None;
        }

        let mut closed = 0;
        while self.indents.len() > 1 && width < self.current_indent() {
            self.indents.pop();
            closed += 1;
        }
        if width != self.current_indent() {
            self.indents.truncate(1);
            self.pending_dedents = 0;
            return Some(self.error(
                loc,
                "Dedent does not match any enclosing indentation level".to_string(),
            ));
        }

        debug!(width, closed, "dedent");
        self.pending_dedents = closed - 1;
        Some(Token::new(TokenKind::Dedent, loc))
    }

    fn current_indent(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    /// Close every open block before reporting end of input
    fn end_of_input(&mut self, loc: SourceLocation) -> Token {
        let open = self.indent_depth();
        if open > 0 {
            self.indents.truncate(1);
            self.pending_dedents = open - 1;
            debug!(closed = open, "draining indentation at end of input");
            return Token::new(TokenKind::Dedent, loc);
        }
        Token::new(TokenKind::Eof, loc)
    }

    /// Newline already consumed
    fn end_of_line(&mut self) -> Token {
        self.at_line_start = true;
        Token::new(TokenKind::Eol, self.location_here())
    }

    fn skip_horizontal_whitespace(&mut self) {
        while let Some(ch) = self.stream.peek() {
            if ch == '\n' || !ch.is_whitespace() {
                break;
            }
            self.stream.advance();
        }
    }

    /// Skip a `#` comment through its newline; false if input ended first
    fn skip_comment(&mut self) -> bool {
        while let Some(ch) = self.stream.advance() {
            if ch == '\n' {
                return true;
            }
        }
        false
    }

    fn identifier_or_keyword(&mut self, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        while let Some(ch) = self.stream.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.stream.advance();
            } else {
                break;
            }
        }

        let kind = TokenKind::keyword(&ident).unwrap_or(TokenKind::Identifier(ident));
        Token::new(kind, loc)
    }

    /// Digits and dots as one run; a run with a dot must parse as a float
    fn number_literal(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.stream.peek() {
            if ch.is_ascii_digit() || ch == '.' {
                text.push(ch);
                self.stream.advance();
            } else {
                break;
            }
        }

        let value = if text.contains('.') {
            text.parse::<f64>().ok().map(NumberValue::Float)
        } else {
            text.parse::<i64>().ok().map(NumberValue::Int)
        };
        let Some(value) = value else {
            return self.error(loc, format!("invalid number literal '{}'", text));
        };

        Token::new(TokenKind::Number(NumberLiteral { text, value }), loc)
    }

    /// Opening quote already consumed
    fn char_literal(&mut self, loc: SourceLocation) -> Token {
        let value = match self.stream.peek() {
            None | Some('\n') => {
                return self.error(loc, "Unterminated character literal".to_string())
            }
            Some('\'') => {
                self.stream.advance();
                return self.error(loc, "Empty character literal".to_string());
            }
            Some('\\') => {
                self.stream.advance();
                let escaped = match self.stream.peek() {
                    None | Some('\n') => {
                        return self
                            .error(loc, "Unterminated character literal".to_string())
                    }
                    Some(c) => c,
                };
                self.stream.advance();
                match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    '\\' => '\\',
                    '\'' => '\'',
                    _ => {
                        return self.error(
                            loc,
                            format!("Unknown escape sequence: \\{}", escaped),
                        )
                    }
                }
            }
            Some(c) => {
                self.stream.advance();
                c
            }
        };

        if self.stream.peek() != Some('\'') {
            return self.error(
                loc,
                "Expected closing quote in character literal".to_string(),
            );
        }
        self.stream.advance();

        let text = match value {
            '\n' => "'\\n'".to_string(),
            '\t' => "'\\t'".to_string(),
            '\r' => "'\\r'".to_string(),
            '\0' => "'\\0'".to_string(),
            '\\' => "'\\\\'".to_string(),
            '\'' => "'\\''".to_string(),
            c => format!("'{}'", c),
        };
        let literal = NumberLiteral {
            text,
            value: NumberValue::Int(value as i64),
        };
        Token::new(TokenKind::Number(literal), loc)
    }

    /// First character already consumed
    fn operator(&mut self, ch: char, loc: SourceLocation) -> Token {
        let kind = match ch {
            '=' => self.either('=', TokenKind::EqEq, TokenKind::Assign),
            '!' => self.either('=', TokenKind::NotEq, TokenKind::Bang),
            '<' => self.either('=', TokenKind::Le, TokenKind::Lt),
            '>' => self.either('=', TokenKind::Ge, TokenKind::Gt),
            '-' => self.either('>', TokenKind::Arrow, TokenKind::Minus),
            '+' => TokenKind::Plus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            _ => return self.error(loc, format!("Unexpected character: '{}'", ch)),
        };
        Token::new(kind, loc)
    }

    fn either(&mut self, next: char, joined: TokenKind, single: TokenKind) -> TokenKind {
        if self.stream.peek() == Some(next) {
            self.stream.advance();
            joined
        } else {
            single
        }
    }

    fn error(&mut self, loc: SourceLocation, message: String) -> Token {
        debug!(line = loc.line, column = loc.column, %message, "lexical error");
        self.error = Some(Diagnostic::lexical(message, loc));
        Token::new(TokenKind::Error, loc)
    }

    /// Location of the next character (1-based column)
    fn location_here(&self) -> SourceLocation {
        let moving = self.stream.location();
        SourceLocation::new(moving.line, moving.column + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::from_source(source)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(name.to_string())
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("def add(x: i32) -> i32: return x\n");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Def,
                ident("add"),
                TokenKind::LParen,
                ident("x"),
                TokenKind::Colon,
                ident("i32"),
                TokenKind::RParen,
                TokenKind::Arrow,
                ident("i32"),
                TokenKind::Colon,
                TokenKind::Return,
                ident("x"),
                TokenKind::Eol,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("== != <= >= -> = ! < > - ~ & | ^ %");
        assert_eq!(
            tokens,
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Arrow,
                TokenKind::Assign,
                TokenKind::Bang,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Minus,
                TokenKind::Tilde,
                TokenKind::Amp,
                TokenKind::Pipe,
                TokenKind::Caret,
                TokenKind::Percent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_indent_and_dedent() {
        let tokens = kinds("if x:\n    y\n    if z:\n        w\nv\n");
        assert_eq!(
            tokens,
            vec![
                TokenKind::If,
                ident("x"),
                TokenKind::Colon,
                TokenKind::Eol,
                TokenKind::Indent,
                ident("y"),
                TokenKind::Eol,
                TokenKind::If,
                ident("z"),
                TokenKind::Colon,
                TokenKind::Eol,
                TokenKind::Indent,
                ident("w"),
                TokenKind::Eol,
                TokenKind::Dedent,
                TokenKind::Dedent,
                ident("v"),
                TokenKind::Eol,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_blank_and_comment_lines_do_not_affect_indentation() {
        let tokens = kinds("a:\n    b\n\n  # note\n\n    c\n");
        assert_eq!(
            tokens,
            vec![
                ident("a"),
                TokenKind::Colon,
                TokenKind::Eol,
                TokenKind::Indent,
                ident("b"),
                TokenKind::Eol,
                ident("c"),
                TokenKind::Eol,
                TokenKind::Dedent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_trailing_comment_ends_line() {
        let tokens = kinds("x = 1 # set x\ny");
        assert_eq!(
            tokens,
            vec![
                ident("x"),
                TokenKind::Assign,
                TokenKind::Number(NumberLiteral {
                    text: "1".into(),
                    value: NumberValue::Int(1)
                }),
                TokenKind::Eol,
                ident("y"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_eof_drains_indentation() {
        let mut lexer = Lexer::from_source("a:\n  b:\n    c");
        let tokens: Vec<TokenKind> = lexer.tokenize().into_iter().map(|t| t.kind).collect();
        let dedents = tokens.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(dedents, 2);
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
        assert_eq!(lexer.indent_depth(), 0);
    }

    #[test]
    fn test_mixed_tabs_and_spaces_rejected() {
        for source in ["a:\n \tb\n", "a:\n\t b\n"] {
            let mut lexer = Lexer::from_source(source);
            let tokens = lexer.tokenize();
            assert!(tokens.iter().any(|t| t.kind == TokenKind::Error), "{source:?}");
        }

        let mut lexer = Lexer::from_source("a:\n \tb\n");
        while lexer.next_token().kind != TokenKind::Error {}
        let diag = lexer.take_error().expect("diagnostic");
        assert_eq!(diag.message, "You cannot mix tabs and spaces in indentation");
    }

    #[test]
    fn test_tab_width_is_eight() {
        let mut lexer = Lexer::from_source("a:\n\tb\n");
        let tokens = lexer.tokenize();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Indent));
        assert_eq!(lexer.last_indent_width(), TAB_WIDTH);
    }

    #[test]
    fn test_bad_dedent_resets_stack() {
        let mut lexer = Lexer::from_source("a:\n    b\n  c\nd\n");
        let tokens = lexer.tokenize();
        let error = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Error)
            .expect("error token");
        assert_eq!(error.location, SourceLocation::new(3, 3));
        // Stack went back to [0]: `d` at column 1 needs no dedent
        let after: Vec<&TokenKind> = tokens
            .iter()
            .skip_while(|t| t.kind != TokenKind::Error)
            .map(|t| &t.kind)
            .collect();
        assert!(!after.contains(&&TokenKind::Dedent));
        assert_eq!(lexer.take_error().map(|d| d.location), Some(error.location));
    }

    #[test]
    fn test_number_literals() {
        let tokens = kinds("42 3.14 .5 7.");
        let values: Vec<NumberValue> = tokens
            .iter()
            .filter_map(|k| match k {
                TokenKind::Number(n) => Some(n.value),
                _ => None,
            })
            .collect();
        assert_eq!(
            values,
            vec![
                NumberValue::Int(42),
                NumberValue::Float(3.14),
                NumberValue::Float(0.5),
                NumberValue::Float(7.0),
            ]
        );
    }

    #[test]
    fn test_malformed_number_rejected() {
        let mut lexer = Lexer::from_source("x = 1.2.3\n");
        let tokens = lexer.tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Error);
        assert_eq!(
            lexer.take_error().map(|d| d.message),
            Some("invalid number literal '1.2.3'".to_string())
        );
    }

    #[test]
    fn test_out_of_range_integer_rejected() {
        let mut lexer = Lexer::from_source("x = 99999999999999999999\n");
        let tokens = lexer.tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Error);
        assert_eq!(
            lexer.take_error().map(|d| d.message),
            Some("invalid number literal '99999999999999999999'".to_string())
        );
    }

    #[test]
    fn test_char_literals() {
        let tokens = kinds(r"'a' '\n' '\''");
        let values: Vec<NumberValue> = tokens
            .iter()
            .filter_map(|k| match k {
                TokenKind::Number(n) => Some(n.value),
                _ => None,
            })
            .collect();
        assert_eq!(
            values,
            vec![
                NumberValue::Int('a' as i64),
                NumberValue::Int('\n' as i64),
                NumberValue::Int('\'' as i64),
            ]
        );
    }

    #[test]
    fn test_bad_char_literals() {
        for source in ["''", "'ab'", "'\\q'", "'a"] {
            let tokens = kinds(source);
            assert!(tokens.contains(&TokenKind::Error), "{source:?}");
        }
    }

    #[test]
    fn test_token_locations() {
        let tokens = Lexer::from_source("x = 1\n  \ny").tokenize();
        assert_eq!(tokens[0].location, SourceLocation::new(1, 1));
        assert_eq!(tokens[1].location, SourceLocation::new(1, 3));
        assert_eq!(tokens[2].location, SourceLocation::new(1, 5));
        // Eol is located after the newline it stands for
        assert_eq!(tokens[3].kind, TokenKind::Eol);
        assert_eq!(tokens[3].location, SourceLocation::new(2, 1));
        assert_eq!(tokens[4].location, SourceLocation::new(3, 1));
    }

    #[test]
    fn test_render_tokens() {
        let mut lexer = Lexer::from_source("def f():\n    return 1\n");
        let mut emitter = Emitter::buffered();
        assert_eq!(
            lexer.render_tokens(&mut emitter),
            "<def> <identifier> <(> <)> <:> <eol>\n\
             <indent=4> <return> <number> <eol>\n\
             <dedent> <eof>\n"
        );
    }

    #[test]
    fn test_render_tokens_reports_every_error() {
        let mut lexer = Lexer::from_source("x = 1.2.3\ny = 4..5\n");
        let mut emitter = Emitter::buffered();
        let dump = lexer.render_tokens(&mut emitter);

        assert_eq!(dump.matches("<error>").count(), 2);
        let messages: Vec<&str> = emitter
            .diagnostics()
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec![
                "invalid number literal '1.2.3'",
                "invalid number literal '4..5'"
            ]
        );
        assert_eq!(emitter.diagnostics()[1].location, SourceLocation::new(2, 5));
        assert!(lexer.take_error().is_none());
    }
}
