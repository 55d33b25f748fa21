//! # Introduction
//!
//! Pyxc is a front end for a small, statically typed language with
//! Python-style indentation. It turns source text into a validated,
//! location-tagged syntax tree that a code generator can consume.
//!
//! ## Pipeline
//!
//! ```text
//! Source → CharStream → Lexer → Parser → Ast → Checker → Backend
//! ```
//!
//! 1. [`parser`]: character stream, indentation-aware lexer, diagnostics
//!    with caret output, and the recursive-descent parser building an arena
//!    [`parser::ast::Ast`].
//! 2. [`types`]: alias and struct tables, type resolution with cycle
//!    detection, struct layouts, and the boundary checks run after each item.
//! 3. [`lower`]: the [`lower::Backend`] contract a code generator implements,
//!    plus an S-expression backend.
//! 4. [`session`]: one explicit session per parse, in file or interactive
//!    mode.
//!
//! ## Language overview
//!
//! ```text
//! extern def putchard(c: i32) -> i32
//!
//! struct Node:
//!     value: int
//!     next: ptr[Node]
//!
//! def sum(n: ptr[Node]) -> i32:
//!     total: i32 = 0
//!     while n.value != 0:
//!         total = total + n.value
//!         n = n.next
//!     return total
//! ```
//!
//! Types: `i8`..`i64`, `u8`..`u64`, `f32`, `f64`, `void`, `ptr[T]`, structs,
//! and aliases (`int`, `char`, `float`, `double`, `long`, `size_t` come
//! predeclared). Control flow: `if/elif/else`, `for ... in range(...)`,
//! `while`, `do ... while`, `match/case`, `break`, `continue`, `return`.

pub mod lower;
pub mod parser;
pub mod session;
pub mod types;

pub use parser::ast::{Ast, Item, ItemKind, SourceLocation};
pub use parser::diagnostics::{Diagnostic, DiagnosticKind, Emitter};
pub use parser::lexer::{Lexer, Token, TokenKind};
pub use session::{Mode, Session, SessionOptions, Step};
pub use types::{ResolvedType, TypeEnv};

/// Parse a whole source text in file mode with a buffered diagnostic sink
pub fn parse_str(source: &str) -> Session {
    let mut session = Session::from_source(source, SessionOptions::default());
    session.run();
    session
}

/// Tokenize a whole source text, up to and including end of input
pub fn tokenize_str(source: &str) -> Vec<Token> {
    Lexer::from_source(source).tokenize()
}
