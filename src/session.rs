//! Parse sessions
//!
//! A [`Session`] owns everything one parse needs: the parser (and through it
//! the lexer, character stream, and diagnostic sink), the alias and struct
//! tables, and the function signatures and globals seen so far. Nothing is
//! process-wide, so independent sessions can run side by side.
//!
//! # Driving a session
//!
//! [`Session::step`] handles one top-level item:
//!
//! 1. Skip line ends (printing the prompt first in interactive mode) and any
//!    stray block ends
//! 2. Parse the item; syntax errors are reported and recovered by the parser
//! 3. Run the boundary checks; a failing item is reported and dropped
//!
//! In file mode the first error of any kind halts the session. In interactive
//! mode the session keeps going, and everything accepted so far stays.

use crate::parser::ast::{Ast, Item};
use crate::parser::diagnostics::{Diagnostic, Emitter};
use crate::parser::lexer::{Lexer, TokenKind};
use crate::parser::parse::Parser;
use crate::types::{Checker, SymbolTable, TypeEnv};
use tracing::{debug, info};

pub const DEFAULT_PROMPT: &str = "ready> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Stop at the first error
    #[default]
    File,
    /// Prompt for each line and keep going after errors
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub mode: Mode,
    pub prompt: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            mode: Mode::File,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl SessionOptions {
    pub fn interactive() -> Self {
        SessionOptions {
            mode: Mode::Interactive,
            ..SessionOptions::default()
        }
    }
}

/// Outcome of [`Session::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An item was accepted; the index into [`Session::items`]
    Item(usize),
    /// An item was rejected and its diagnostic emitted
    Failed,
    /// End of input, or the session halted
    Finished,
}

pub struct Session {
    parser: Parser,
    env: TypeEnv,
    symbols: SymbolTable,
    items: Vec<Item>,
    options: SessionOptions,
    halted: bool,
}

impl Session {
    pub fn new(lexer: Lexer, emitter: Emitter, options: SessionOptions) -> Self {
        Session {
            parser: Parser::new(lexer, emitter),
            env: TypeEnv::new(),
            symbols: SymbolTable::default(),
            items: Vec::new(),
            options,
            halted: false,
        }
    }

    /// In-memory session with a buffered diagnostic sink
    pub fn from_source(source: &str, options: SessionOptions) -> Self {
        Session::new(Lexer::from_source(source), Emitter::buffered(), options)
    }

    /// Handle the next top-level item
    pub fn step(&mut self) -> Step {
        if self.halted {
            return Step::Finished;
        }

        loop {
            match self.parser.current().kind {
                TokenKind::Eof => return Step::Finished,
                TokenKind::Eol => {
                    if self.options.mode == Mode::Interactive {
                        let prompt = self.options.prompt.clone();
                        self.parser.emitter_mut().write(&prompt);
                    }
                    self.parser.advance();
                }
                TokenKind::Dedent => {
                    self.parser.advance();
                }
                _ => break,
            }
        }

        let mark = self.parser.mark();
        let Some(item) = self.parser.parse_item(&mut self.env) else {
            return self.failed();
        };

        let checked = Checker::new(&mut self.env, &mut self.symbols, self.parser.ast()).check_item(&item);
        if let Err(diagnostic) = checked {
            self.parser.emit(diagnostic);
            self.parser.rollback(mark);
            return self.failed();
        }

        debug!(line = item.location.line, "accepted item");
        self.items.push(item);
        Step::Item(self.items.len() - 1)
    }

    fn failed(&mut self) -> Step {
        if self.options.mode == Mode::File {
            debug!("halting after error");
            self.halted = true;
        }
        Step::Failed
    }

    /// Run to the end of input
    pub fn run(&mut self) {
        self.run_with(|_, _, _| {});
    }

    /// Run to the end of input, handing each accepted item to `on_item`
    pub fn run_with(&mut self, mut on_item: impl FnMut(&Ast, &TypeEnv, &Item)) {
        info!(mode = ?self.options.mode, "session started");
        loop {
            match self.step() {
                Step::Item(index) => on_item(self.parser.ast(), &self.env, &self.items[index]),
                Step::Failed => {}
                Step::Finished => break,
            }
        }
        info!(
            items = self.items.len(),
            errors = self.parser.emitter().error_count(),
            "session finished"
        );
    }

    /// Start over on new input with fresh tables. Diagnostics are kept.
    pub fn restart(&mut self, lexer: Lexer) {
        self.parser.reset_input(lexer);
        self.env.reset();
        self.symbols.clear();
        self.items.clear();
        self.halted = false;
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn ast(&self) -> &Ast {
        self.parser.ast()
    }

    pub fn env(&self) -> &TypeEnv {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut TypeEnv {
        &mut self.env
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn emitter(&self) -> &Emitter {
        self.parser.emitter()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.parser.emitter().diagnostics()
    }

    pub fn had_error(&self) -> bool {
        self.parser.emitter().has_errors()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::ItemKind;
    use crate::types::ResolvedType;

    fn run(source: &str, options: SessionOptions) -> Session {
        let mut session = Session::from_source(source, options);
        session.run();
        session
    }

    #[test]
    fn test_items_collected() {
        let session = run(
            "extern def putchard(c: i32) -> i32\n\ndef main() -> i32:\n    putchard(65)\n    return 0\n",
            SessionOptions::default(),
        );
        assert!(!session.had_error());
        assert_eq!(session.items().len(), 2);
        assert!(matches!(session.items()[1].kind, ItemKind::Function { .. }));
        assert!(session.symbols().functions.contains_key("putchard"));
        assert!(session.symbols().functions.contains_key("main"));
    }

    #[test]
    fn test_file_mode_halts_on_first_error() {
        let session = run("x = = 1\ny: i32 = 2\nz = )\n", SessionOptions::default());
        assert_eq!(session.diagnostics().len(), 1);
        assert!(session.items().is_empty());
        assert!(session.is_halted());
    }

    #[test]
    fn test_interactive_mode_continues() {
        let session = run("x = = 1\ny: i32 = 2\nz = )\n", SessionOptions::interactive());
        assert_eq!(session.diagnostics().len(), 2);
        assert_eq!(session.items().len(), 1);
        assert_eq!(
            session.symbols().globals.get("y"),
            Some(&ResolvedType::Int { bits: 32, signed: true })
        );
    }

    #[test]
    fn test_prompt_printed_per_line() {
        let session = run("1 + 2\n3\n", SessionOptions::interactive());
        assert_eq!(session.emitter().output(), "ready> ready> ready> ");
    }

    #[test]
    fn test_check_failure_drops_item() {
        let session = run(
            "struct P:\n    x: int\n\np: P\np.y\n",
            SessionOptions::interactive(),
        );
        assert_eq!(session.items().len(), 2);
        assert_eq!(session.diagnostics().len(), 1);
        assert_eq!(session.diagnostics()[0].message, "Unknown field 'y' in struct 'P'");
    }

    #[test]
    fn test_restart_resets_tables() {
        let mut session = Session::from_source("type Id = i64\nx: Id\n", SessionOptions::default());
        session.run();
        assert!(session.env().alias("Id").is_some());
        assert!(session.symbols().globals.contains_key("x"));

        session.restart(Lexer::from_source("y: int\n"));
        session.run();
        assert!(session.env().alias("Id").is_none());
        assert!(!session.symbols().globals.contains_key("x"));
        assert_eq!(session.items().len(), 1);
    }
}
