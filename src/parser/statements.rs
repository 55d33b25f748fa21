//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Control flow: `if`/`elif`/`else`, `for ... in range(...)`, `while`,
//!   `do ... while`, `match`/`case`
//! - Jumps: `return`, `break`, `continue`
//! - `print(args)`
//! - Identifier-led statements: typed declarations (`x: i32 = 1`),
//!   assignments (`p.x = 1`), and expression statements
//!
//! # Suites
//!
//! A suite is either a single statement on the same line as its header
//! (`if x: return 1`) or a newline followed by an indented block.
//!
//! ```text
//! suite ::= statement | EOL INDENT statement (EOL statement)* DEDENT
//! ```
//!
//! `elif` is sugar: `if a: X elif b: Y else: Z` produces the same tree as
//! `if a: X else: (if b: Y else: Z)`.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseResult, Parser};
use tracing::trace;

impl Parser {
    /// Parse a statement body
    pub(crate) fn parse_suite(&mut self) -> ParseResult<Suite> {
        let location = self.current_location();
        if !self.check(&TokenKind::Eol) {
            let stmt = self.parse_statement()?;
            return Ok(Suite {
                stmts: vec![stmt],
                location,
            });
        }

        self.advance(); // consume EOL
        let location = self.current_location();
        self.expect_token(&TokenKind::Indent, "Expected an indented block")?;
        let stmts = self.parse_block_statements()?;
        self.expect_token(&TokenKind::Dedent, "Expected end of indented block")?;

        Ok(Suite { stmts, location })
    }

    /// Parse statements up to the dedent that closes the block
    pub(crate) fn parse_block_statements(&mut self) -> ParseResult<Vec<StmtId>> {
        let mut stmts = Vec::new();

        loop {
            while self.match_token(&TokenKind::Eol) {}
            if self.check(&TokenKind::Dedent) || self.check(&TokenKind::Eof) {
                break;
            }

            stmts.push(self.parse_statement()?);

            if !self.at_statement_end() {
                return Err(self.error_here("Expected newline after statement"));
            }
        }

        if stmts.is_empty() {
            return Err(self.error_here("Expected at least one statement in block"));
        }
        Ok(stmts)
    }

    /// Parse a single statement
    pub(crate) fn parse_statement(&mut self) -> ParseResult<StmtId> {
        trace!(token = ?self.current.kind, "statement");
        match self.current.kind {
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::Match => self.parse_match_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Print => self.parse_print_statement(),
            TokenKind::Break => {
                let location = self.current_location();
                self.advance();
                Ok(self.ast.push_stmt(StmtKind::Break, location))
            }
            TokenKind::Continue => {
                let location = self.current_location();
                self.advance();
                Ok(self.ast.push_stmt(StmtKind::Continue, location))
            }
            TokenKind::Elif | TokenKind::Else => {
                Err(self.error_here("Unexpected branch without a matching 'if'"))
            }
            TokenKind::Case => Err(self.error_here("Unexpected 'case' outside of 'match'")),
            TokenKind::Def | TokenKind::Extern | TokenKind::Type | TokenKind::Struct => {
                Err(self.error_here("Declarations are only allowed at top level"))
            }
            TokenKind::Identifier(_) => self.parse_identifier_statement(),
            _ => {
                let location = self.current_location();
                let expr = self.parse_expression()?;
                Ok(self.ast.push_stmt(StmtKind::Expr(expr), location))
            }
        }
    }

    /// Identifier-led statement: typed declaration, assignment, or expression
    fn parse_identifier_statement(&mut self) -> ParseResult<StmtId> {
        let location = self.current_location();
        let lhs = self.parse_postfix_expression()?;

        if self.check(&TokenKind::Colon) {
            let ExprKind::Variable(name) = &self.ast.expr(lhs).kind else {
                return Err(self.error_here("Expected a plain name before ':' in declaration"));
            };
            let name = name.clone();
            self.advance(); // consume ':'
            let ty = self.parse_type_expr()?;
            let init = if self.match_token(&TokenKind::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            return Ok(self
                .ast
                .push_stmt(StmtKind::Declaration { name, ty, init }, location));
        }

        if self.check(&TokenKind::Assign) {
            if !self.ast.expr(lhs).kind.is_addressable() {
                return Err(self.semantic_error("Assignment target is not addressable", location));
            }
            self.advance(); // consume '='
            let value = self.parse_expression()?;
            return Ok(self
                .ast
                .push_stmt(StmtKind::Assign { target: lhs, value }, location));
        }

        let expr = self.parse_binop_rhs(0, lhs)?;
        Ok(self.ast.push_stmt(StmtKind::Expr(expr), location))
    }

    /// Parse if statement: if cond: suite [elif cond: suite]* [else: suite]
    fn parse_if_statement(&mut self) -> ParseResult<StmtId> {
        let location = self.current_location();
        self.advance(); // consume 'if' or 'elif'

        let condition = self.parse_expression()?;
        self.expect_colon("after if condition")?;
        let then_branch = self.parse_suite()?;

        let else_branch = if self.check(&TokenKind::Elif) {
            let nested_location = self.current_location();
            let nested = self.parse_if_statement()?;
            Some(Suite {
                stmts: vec![nested],
                location: nested_location,
            })
        } else if self.match_token(&TokenKind::Else) {
            self.expect_colon("after 'else'")?;
            Some(self.parse_suite()?)
        } else {
            None
        };

        Ok(self.ast.push_stmt(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            location,
        ))
    }

    /// Parse for statement: for name in range(start, end[, step]): suite
    fn parse_for_statement(&mut self) -> ParseResult<StmtId> {
        let location = self.current_location();
        self.advance(); // consume 'for'

        let var = self.expect_identifier("Expected loop variable after 'for'")?;
        self.expect_token(&TokenKind::In, "Expected 'in' after loop variable")?;
        self.expect_token(&TokenKind::Range, "Expected 'range' in for loop")?;
        self.expect_lparen("after 'range'")?;
        let start = self.parse_expression()?;
        self.expect_token(&TokenKind::Comma, "Expected ',' after range start")?;
        let end = self.parse_expression()?;
        let step = if self.match_token(&TokenKind::Comma) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_rparen("after range arguments")?;
        self.expect_colon("after for header")?;
        let body = self.parse_suite()?;

        Ok(self.ast.push_stmt(
            StmtKind::For {
                var,
                start,
                end,
                step,
                body,
            },
            location,
        ))
    }

    /// Parse while statement: while cond: suite
    fn parse_while_statement(&mut self) -> ParseResult<StmtId> {
        let location = self.current_location();
        self.advance(); // consume 'while'

        let condition = self.parse_expression()?;
        self.expect_colon("after while condition")?;
        let body = self.parse_suite()?;

        Ok(self
            .ast
            .push_stmt(StmtKind::While { condition, body }, location))
    }

    /// Parse do-while statement: do: suite while cond
    fn parse_do_while_statement(&mut self) -> ParseResult<StmtId> {
        let location = self.current_location();
        self.advance(); // consume 'do'

        self.expect_colon("after 'do'")?;
        let body = self.parse_suite()?;
        self.expect_token(&TokenKind::While, "Expected 'while' after do body")?;
        let condition = self.parse_expression()?;

        Ok(self
            .ast
            .push_stmt(StmtKind::DoWhile { body, condition }, location))
    }

    /// Parse match statement:
    ///
    /// ```text
    /// match expr:
    ///     case 1: suite
    ///     case _: suite
    /// ```
    fn parse_match_statement(&mut self) -> ParseResult<StmtId> {
        let location = self.current_location();
        self.advance(); // consume 'match'

        let scrutinee = self.parse_expression()?;
        self.expect_colon("after match expression")?;
        self.expect_token(&TokenKind::Eol, "Expected newline after match header")?;
        self.expect_token(&TokenKind::Indent, "Expected indented case list")?;

        let mut arms = Vec::new();
        let mut has_wildcard = false;
        loop {
            while self.match_token(&TokenKind::Eol) {}
            if self.check(&TokenKind::Dedent) || self.check(&TokenKind::Eof) {
                break;
            }

            let arm_location = self.current_location();
            self.expect_token(&TokenKind::Case, "Expected 'case' in match block")?;

            let pattern = match &self.current.kind {
                TokenKind::Identifier(name) if name == "_" => {
                    if has_wildcard {
                        return Err(self.semantic_error(
                            "Duplicate wildcard case '_' in match",
                            self.current_location(),
                        ));
                    }
                    has_wildcard = true;
                    self.advance();
                    CasePattern::Wildcard
                }
                _ => CasePattern::Value(self.parse_expression()?),
            };

            self.expect_colon("after case pattern")?;
            let body = self.parse_suite()?;
            arms.push(MatchArm {
                pattern,
                body,
                location: arm_location,
            });

            if !self.at_statement_end() {
                return Err(self.error_here("Expected newline after case"));
            }
        }

        if arms.is_empty() {
            return Err(self.error_here("Expected at least one case in match"));
        }
        self.expect_token(&TokenKind::Dedent, "Expected end of match block")?;

        Ok(self
            .ast
            .push_stmt(StmtKind::Match { scrutinee, arms }, location))
    }

    /// Parse return statement: return [expr]
    fn parse_return_statement(&mut self) -> ParseResult<StmtId> {
        let location = self.current_location();
        self.advance(); // consume 'return'

        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };

        Ok(self.ast.push_stmt(StmtKind::Return(value), location))
    }

    /// Parse print statement: print(expr, ...)
    fn parse_print_statement(&mut self) -> ParseResult<StmtId> {
        let location = self.current_location();
        self.advance(); // consume 'print'

        self.expect_lparen("after 'print'")?;
        let args = self.parse_argument_list("in print arguments")?;
        self.expect_rparen("after print arguments")?;

        Ok(self.ast.push_stmt(StmtKind::Print(args), location))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::diagnostics::Emitter;
    use crate::parser::lexer::Lexer;
    use crate::parser::parse::Parser;
    use crate::types::TypeEnv;

    fn parse_stmt(source: &str) -> (Parser, Option<StmtId>) {
        let mut parser = Parser::new(Lexer::from_source(source), Emitter::buffered());
        parser.advance();
        let stmt = match parser.parse_item(&mut TypeEnv::new()).map(|i| i.kind) {
            Some(ItemKind::Statement(id)) => Some(id),
            Some(other) => panic!("Expected statement, got {:?}", other),
            None => None,
        };
        (parser, stmt)
    }

    fn errors(parser: &Parser) -> Vec<String> {
        parser
            .emitter()
            .diagnostics()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }

    #[test]
    fn test_typed_declaration() {
        let (parser, stmt) = parse_stmt("count: i32 = 3\n");
        let ast = parser.ast();
        match &ast.stmt(stmt.expect("statement")).kind {
            StmtKind::Declaration { name, ty, init } => {
                assert_eq!(name, "count");
                assert_eq!(*ty, TypeExpr::Builtin(BuiltinType::I32));
                assert!(init.is_some());
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_to_member_and_index() {
        for source in ["p.x = 1\n", "a[2] = 1\n", "a[i].next = p\n"] {
            let (parser, stmt) = parse_stmt(source);
            let stmt = stmt.unwrap_or_else(|| panic!("{source:?}: {:?}", errors(&parser)));
            assert!(matches!(
                parser.ast().stmt(stmt).kind,
                StmtKind::Assign { .. }
            ));
        }
    }

    #[test]
    fn test_assignment_to_call_rejected() {
        let (parser, stmt) = parse_stmt("f(x) = 1\n");
        assert!(stmt.is_none());
        assert_eq!(errors(&parser), vec!["Assignment target is not addressable"]);
    }

    #[test]
    fn test_expression_statement_continues_after_identifier() {
        let (parser, stmt) = parse_stmt("x + 1 * y\n");
        let ast = parser.ast();
        let StmtKind::Expr(expr) = ast.stmt(stmt.expect("statement")).kind else {
            panic!("Expected expression statement");
        };
        assert!(matches!(
            ast.expr(expr).kind,
            ExprKind::Binary { op: BinOp::Add, .. }
        ));
    }

    #[test]
    fn test_for_range_with_step() {
        let (parser, stmt) = parse_stmt("for i in range(0, 10, 2): print(i)\n");
        match &parser.ast().stmt(stmt.expect("statement")).kind {
            StmtKind::For { var, step, body, .. } => {
                assert_eq!(var, "i");
                assert!(step.is_some());
                assert_eq!(body.stmts.len(), 1);
            }
            other => panic!("Expected for loop, got {:?}", other),
        }
    }

    #[test]
    fn test_do_while_block() {
        let (parser, stmt) = parse_stmt("do:\n    x = x + 1\n    y = y - 1\nwhile x < 3\n");
        match &parser.ast().stmt(stmt.expect("statement")).kind {
            StmtKind::DoWhile { body, .. } => assert_eq!(body.stmts.len(), 2),
            other => panic!("Expected do-while, got {:?}", other),
        }
    }

    #[test]
    fn test_match_with_wildcard() {
        let source = "match x:\n    case 1: print(1)\n    case -2:\n        print(2)\n    case _: print(0)\n";
        let (parser, stmt) = parse_stmt(source);
        let stmt = stmt.unwrap_or_else(|| panic!("{:?}", errors(&parser)));
        match &parser.ast().stmt(stmt).kind {
            StmtKind::Match { arms, .. } => {
                assert_eq!(arms.len(), 3);
                assert_eq!(arms[2].pattern, CasePattern::Wildcard);
            }
            other => panic!("Expected match, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_wildcard_rejected() {
        let source = "match x:\n    case _: print(1)\n    case _: print(2)\n";
        let (parser, stmt) = parse_stmt(source);
        assert!(stmt.is_none());
        let diags = parser.emitter().diagnostics();
        assert_eq!(diags[0].message, "Duplicate wildcard case '_' in match");
        assert_eq!(diags[0].location, SourceLocation::new(3, 10));
    }

    #[test]
    fn test_print_trailing_comma_rejected() {
        let (parser, stmt) = parse_stmt("print(1, 2,)\n");
        assert!(stmt.is_none());
        assert_eq!(
            errors(&parser),
            vec!["Expected an expression in print arguments, found ')'"]
        );
    }

    #[test]
    fn test_return_without_value() {
        let (parser, stmt) = parse_stmt("return\n");
        assert!(matches!(
            parser.ast().stmt(stmt.expect("statement")).kind,
            StmtKind::Return(None)
        ));
    }

    #[test]
    fn test_empty_block_rejected() {
        let (parser, stmt) = parse_stmt("while x:\n\nnext\n");
        assert!(stmt.is_none());
        assert_eq!(
            errors(&parser),
            vec!["Expected an indented block, found identifier 'next'"]
        );
    }
}
