//! Pyxc source parser
//!
//! This module transforms Pyxc source text into a syntax tree:
//! - [`source`]: Character input (line-at-a-time, location tracking, line retention)
//! - [`lexer`]: Tokenization, including indentation tokens
//! - [`diagnostics`]: Error values, caret rendering, and the output sink
//! - [`parse`]: Parsing (tokens → arena [`ast::Ast`]) and panic-mode recovery
//! - [`ast`]: Syntax tree definitions
//!
//! # Language Overview
//!
//! Pyxc is an indentation-sensitive, statically typed language:
//! - Items: `def`, `extern def`, `type` aliases, `struct` declarations, and
//!   top-level statements
//! - Types: `i8`..`i64`, `u8`..`u64`, `f32`, `f64`, `void`, aliases, structs,
//!   `ptr[T]`
//! - Statements: typed declarations, assignments, `if`/`elif`/`else`,
//!   `for ... in range(...)`, `while`, `do ... while`, `match`/`case`,
//!   `print`, `return`, `break`, `continue`
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary
//! operators. Tokens are pulled on demand so interactive input is parsed as it
//! arrives.

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parse;
pub mod source;

mod declarations;
mod expressions;
mod statements;

pub use expressions::binary_operator;
