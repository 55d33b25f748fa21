//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and panic-mode recovery.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: Top-level items (functions, externs, type aliases, structs)
//! - `statements`: Statements and suites (if, for, while, match, ...)
//! - `expressions`: Expressions with precedence climbing
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! The parser pulls one token at a time from the [`Lexer`]; nothing is
//! buffered beyond the current token, so an interactive session only reads
//! as much input as the current construct needs.

use crate::parser::ast::*;
use crate::parser::diagnostics::{self, Diagnostic, Emitter};
use crate::parser::lexer::{Lexer, Token, TokenKind};
use tracing::debug;

/// Parser error type
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Not yet reported
    Diagnostic(Diagnostic),
    /// The lexer rejected the current token; its diagnostic is already out
    Lexical,
}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        ParseError::Diagnostic(diagnostic)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Token classes recovery may stop at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPoint {
    EndOfLine,
    EndOfInput,
    Dedent,
}

impl SyncPoint {
    fn matches(self, kind: &TokenKind) -> bool {
        matches!(
            (self, kind),
            (SyncPoint::EndOfLine, TokenKind::Eol)
                | (SyncPoint::EndOfInput, TokenKind::Eof)
                | (SyncPoint::Dedent, TokenKind::Dedent)
        )
    }
}

/// Set of tokens panic-mode recovery skips to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSet(&'static [SyncPoint]);

impl SyncSet {
    /// Resume at the next line
    pub const LINE: SyncSet = SyncSet(&[SyncPoint::EndOfLine, SyncPoint::EndOfInput]);
    /// Resume at the end of the enclosing block
    pub const BLOCK: SyncSet = SyncSet(&[SyncPoint::Dedent, SyncPoint::EndOfInput]);

    pub fn contains(&self, kind: &TokenKind) -> bool {
        // End of input always stops recovery
        *kind == TokenKind::Eof || self.0.iter().any(|p| p.matches(kind))
    }
}

/// Recursive descent parser for Pyxc
pub struct Parser {
    pub(crate) lexer: Lexer,
    pub(crate) current: Token,
    pub(crate) emitter: Emitter,
    pub(crate) ast: Ast,
    /// The last consumed token closed a block
    pub(crate) after_dedent: bool,
}

impl Parser {
    /// The parser starts positioned on a synthetic line end, so the first
    /// call to [`Parser::advance`] loads the first real token
    pub fn new(lexer: Lexer, emitter: Emitter) -> Self {
        Parser {
            lexer,
            current: Token::new(TokenKind::Eol, SourceLocation::new(0, 0)),
            emitter,
            ast: Ast::new(),
            after_dedent: false,
        }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut Emitter {
        &mut self.emitter
    }

    /// Replace the token source, keeping diagnostics and the arena
    pub fn reset_input(&mut self, lexer: Lexer) {
        self.lexer = lexer;
        self.current = Token::new(TokenKind::Eol, SourceLocation::new(0, 0));
        self.after_dedent = false;
        self.ast.clear();
    }

    /// Parse one top-level item, reporting and recovering on error
    pub fn parse_item(&mut self, env: &mut crate::types::TypeEnv) -> Option<Item> {
        let mark = self.ast.mark();
        let result = self.parse_item_inner(env).and_then(|item| {
            self.expect_item_end()?;
            Ok(item)
        });

        match result {
            Ok(item) => Some(item),
            Err(err) => {
                self.report(err);
                self.ast.rollback(mark);
                self.synchronize(SyncSet::LINE);
                None
            }
        }
    }

    /// Panic-mode recovery: discard tokens until one in `sync` (or end of
    /// input) is current. The sync token itself is left in place.
    pub fn synchronize(&mut self, sync: SyncSet) {
        let mut skipped = 0usize;
        while !sync.contains(&self.current.kind) {
            self.advance();
            skipped += 1;
        }
        debug!(skipped, at = ?self.current.kind, "recovered");
    }

    /// Emit a parse error unless the lexer already reported it
    pub fn report(&mut self, err: ParseError) {
        if let ParseError::Diagnostic(diagnostic) = err {
            self.emit(diagnostic);
        }
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.emitter.emit(diagnostic, self.lexer.stream());
    }

    pub fn mark(&self) -> AstMark {
        self.ast.mark()
    }

    pub fn rollback(&mut self, mark: AstMark) {
        self.ast.rollback(mark);
    }

    // ===== Helper methods =====

    /// Consume the current token and load the next one.
    /// A lexical error is reported as soon as its token becomes current.
    pub(crate) fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        if next.kind == TokenKind::Error {
            if let Some(diagnostic) = self.lexer.take_error() {
                self.emit(diagnostic);
            }
        }
        let previous = std::mem::replace(&mut self.current, next);
        self.after_dedent = previous.kind == TokenKind::Dedent;
        previous
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.current.location
    }

    /// Syntax error "at" the current token: `{message}, found {token}`
    pub(crate) fn error_here(&self, message: &str) -> ParseError {
        if self.current.kind == TokenKind::Error {
            return ParseError::Lexical;
        }
        let location = diagnostics::anchor_location(
            self.current.location,
            &self.current.kind,
            self.lexer.stream(),
        );
        ParseError::Diagnostic(Diagnostic::syntax(
            format!("{}, found {}", message, self.current.kind),
            location,
        ))
    }

    pub(crate) fn semantic_error(
        &self,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> ParseError {
        ParseError::Diagnostic(Diagnostic::semantic(message, location))
    }

    pub(crate) fn expect_token(
        &mut self,
        kind: &TokenKind,
        message: &str,
    ) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    pub(crate) fn expect_colon(&mut self, ctx: &str) -> ParseResult<()> {
        self.expect_token(&TokenKind::Colon, &format!("Expected ':' {ctx}"))?;
        Ok(())
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> ParseResult<()> {
        self.expect_token(&TokenKind::LParen, &format!("Expected '(' {ctx}"))?;
        Ok(())
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> ParseResult<()> {
        self.expect_token(&TokenKind::RParen, &format!("Expected ')' {ctx}"))?;
        Ok(())
    }

    pub(crate) fn expect_identifier(&mut self, message: &str) -> ParseResult<String> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_here(message))
        }
    }

    /// Statements end at a newline, at the end of input, or right after a
    /// block they introduced
    pub(crate) fn at_statement_end(&self) -> bool {
        self.after_dedent
            || matches!(
                self.current.kind,
                TokenKind::Eol | TokenKind::Eof | TokenKind::Dedent
            )
    }

    fn expect_item_end(&self) -> ParseResult<()> {
        if self.after_dedent || matches!(self.current.kind, TokenKind::Eol | TokenKind::Eof)
        {
            Ok(())
        } else {
            Err(self.error_here("Expected newline after top-level item"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeEnv;

    fn parser(source: &str) -> Parser {
        let mut parser = Parser::new(Lexer::from_source(source), Emitter::buffered());
        parser.advance();
        parser
    }

    #[test]
    fn test_parse_simple_function() {
        let mut parser = parser("def main() -> i32: return 0\n");
        let item = parser.parse_item(&mut TypeEnv::new()).expect("item");

        match &item.kind {
            ItemKind::Function { proto, body } => {
                assert_eq!(proto.name, "main");
                assert!(proto.params.is_empty());
                assert_eq!(proto.return_type, TypeExpr::Builtin(BuiltinType::I32));
                assert_eq!(body.stmts.len(), 1);
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
        assert!(!parser.emitter().has_errors());
    }

    #[test]
    fn test_expect_token_message() {
        let mut parser = parser("def f(x i32) -> i32: return x\n");
        assert!(parser.parse_item(&mut TypeEnv::new()).is_none());
        let diags = parser.emitter().diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].message,
            "Expected ':' after parameter name, found identifier 'i32'"
        );
        assert_eq!(diags[0].location, SourceLocation::new(1, 9));
    }

    #[test]
    fn test_recovery_stops_at_line_end() {
        let mut parser = parser("x = = 1\ny = 2\n");
        let mut env = TypeEnv::new();
        assert!(parser.parse_item(&mut env).is_none());
        assert_eq!(parser.current().kind, TokenKind::Eol);
        assert_eq!(parser.ast().expr_count(), 0);

        parser.advance();
        assert!(parser.parse_item(&mut env).is_some());
        assert_eq!(parser.emitter().error_count(), 1);
    }

    #[test]
    fn test_block_sync_skips_to_dedent() {
        let mut parser = parser("x:\n    y z\nw\n");
        parser.synchronize(SyncSet::BLOCK);
        assert_eq!(parser.current().kind, TokenKind::Dedent);
        assert_eq!(parser.current().location, SourceLocation::new(3, 1));

        parser.synchronize(SyncSet::LINE);
        assert_eq!(parser.current().kind, TokenKind::Eol);
        assert_eq!(parser.current().location, SourceLocation::new(4, 1));
    }

    #[test]
    fn test_error_at_newline_points_past_line() {
        let mut parser = parser("if x > 1\n    y\n");
        assert!(parser.parse_item(&mut TypeEnv::new()).is_none());
        let diag = &parser.emitter().diagnostics()[0];
        assert_eq!(
            diag.message,
            "Expected ':' after if condition, found newline"
        );
        assert_eq!(diag.location, SourceLocation::new(1, 9));
        assert!(parser.emitter().output().contains("if x > 1\n        ^~~~\n"));
    }

    #[test]
    fn test_lexical_error_reported_once() {
        let mut parser = parser("x = 1.2.3 + 4\n");
        assert!(parser.parse_item(&mut TypeEnv::new()).is_none());
        let diags = parser.emitter().diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "invalid number literal '1.2.3'");
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let mut parser = parser("x = 1 2\n");
        assert!(parser.parse_item(&mut TypeEnv::new()).is_none());
        assert_eq!(
            parser.emitter().diagnostics()[0].message,
            "Expected newline after top-level item, found number '2'"
        );
    }
}
