//! Expression parsing implementation
//!
//! Binary operators are parsed by precedence climbing over the table below;
//! every binary operator is left-associative.
//!
//! | Precedence | Operators              |
//! |------------|------------------------|
//! | 5          | `or`                   |
//! | 6          | `and`                  |
//! | 7          | `\|`                   |
//! | 8          | `^`                    |
//! | 9          | `&`                    |
//! | 10         | `==` `!=`              |
//! | 12         | `<` `>` `<=` `>=`      |
//! | 20         | `+` `-`                |
//! | 40         | `*` `/` `%`            |
//!
//! Unary prefix operators (`-`, `+`, `!`, `not`, `~`) bind tighter than any
//! binary operator, and postfix forms (call, index, member) tighter still.
//!
//! ```text
//! unary   ::= ("-" | "+" | "!" | "not" | "~") unary | postfix
//! postfix ::= primary ("(" args ")" | "[" expr "]" | "." identifier)*
//! primary ::= number | identifier | "addr" "(" expr ")" | "(" expr ")"
//! ```

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseResult, Parser};

/// Binary operator and precedence for a token, if it is one
pub fn binary_operator(kind: &TokenKind) -> Option<(BinOp, u8)> {
    let entry = match kind {
        TokenKind::Or => (BinOp::Or, 5),
        TokenKind::And => (BinOp::And, 6),
        TokenKind::Pipe => (BinOp::BitOr, 7),
        TokenKind::Caret => (BinOp::BitXor, 8),
        TokenKind::Amp => (BinOp::BitAnd, 9),
        TokenKind::EqEq => (BinOp::Eq, 10),
        TokenKind::NotEq => (BinOp::Ne, 10),
        TokenKind::Lt => (BinOp::Lt, 12),
        TokenKind::Gt => (BinOp::Gt, 12),
        TokenKind::Le => (BinOp::Le, 12),
        TokenKind::Ge => (BinOp::Ge, 12),
        TokenKind::Plus => (BinOp::Add, 20),
        TokenKind::Minus => (BinOp::Sub, 20),
        TokenKind::Star => (BinOp::Mul, 40),
        TokenKind::Slash => (BinOp::Div, 40),
        TokenKind::Percent => (BinOp::Mod, 40),
        _ => return None,
    };
    Some(entry)
}

impl Parser {
    /// Parse expression (entry point)
    pub(crate) fn parse_expression(&mut self) -> ParseResult<ExprId> {
        let lhs = self.parse_unary()?;
        self.parse_binop_rhs(0, lhs)
    }

    /// Fold binary operators of precedence >= `min_prec` onto `lhs`
    pub(crate) fn parse_binop_rhs(&mut self, min_prec: u8, mut lhs: ExprId) -> ParseResult<ExprId> {
        loop {
            let Some((op, prec)) = binary_operator(&self.current.kind) else {
                return Ok(lhs);
            };
            if prec < min_prec {
                return Ok(lhs);
            }

            let location = self.current_location();
            self.advance(); // consume operator
            let mut rhs = self.parse_unary()?;

            // A tighter operator after rhs takes rhs as its left operand
            if let Some((_, next_prec)) = binary_operator(&self.current.kind) {
                if prec < next_prec {
                    rhs = self.parse_binop_rhs(prec + 1, rhs)?;
                }
            }

            lhs = self.ast.push_expr(ExprKind::Binary { op, lhs, rhs }, location);
        }
    }

    /// Parse unary (- + ! not ~)
    fn parse_unary(&mut self) -> ParseResult<ExprId> {
        let location = self.current_location();
        let op = match self.current.kind {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Bang | TokenKind::Not => Some(UnOp::Not),
            TokenKind::Tilde => Some(UnOp::BitNot),
            TokenKind::Plus => None,
            _ => return self.parse_postfix_expression(),
        };
        self.advance(); // consume operator

        let operand = self.parse_unary()?;
        Ok(match op {
            Some(op) => self.ast.push_expr(ExprKind::Unary { op, operand }, location),
            // Unary plus is the identity
            None => operand,
        })
    }

    /// Parse postfix (call, index, member access)
    pub(crate) fn parse_postfix_expression(&mut self) -> ParseResult<ExprId> {
        let mut expr = self.parse_primary()?;

        loop {
            let location = self.current_location();

            if self.match_token(&TokenKind::LParen) {
                let ExprKind::Variable(callee) = &self.ast.expr(expr).kind else {
                    return Err(self.semantic_error("Only named functions can be called", location));
                };
                let callee = callee.clone();
                let args = self.parse_argument_list("in argument list")?;
                self.expect_rparen("after function arguments")?;
                let call_location = self.ast.expr(expr).location;
                expr = self
                    .ast
                    .push_expr(ExprKind::Call { callee, args }, call_location);
            } else if self.match_token(&TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.expect_token(&TokenKind::RBracket, "Expected ']' after index")?;
                expr = self
                    .ast
                    .push_expr(ExprKind::Index { base: expr, index }, location);
            } else if self.match_token(&TokenKind::Dot) {
                let field = self.expect_identifier("Expected field name after '.'")?;
                expr = self
                    .ast
                    .push_expr(ExprKind::Member { object: expr, field }, location);
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse comma-separated expressions up to (not including) ')'
    pub(crate) fn parse_argument_list(&mut self, ctx: &str) -> ParseResult<Vec<ExprId>> {
        let mut args = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            if self.check(&TokenKind::RParen) {
                return Err(self.error_here(&format!("Expected an expression {ctx}")));
            }
            args.push(self.parse_expression()?);

            if self.match_token(&TokenKind::Comma) {
                continue;
            }
            if !self.check(&TokenKind::RParen) {
                return Err(self.error_here(&format!("Expected ')' or ',' {ctx}")));
            }
            break;
        }

        Ok(args)
    }

    /// Parse primary (literals, names, addr(...), parenthesized expressions)
    fn parse_primary(&mut self) -> ParseResult<ExprId> {
        let location = self.current_location();

        match &self.current.kind {
            TokenKind::Number(literal) => {
                let value = literal.value;
                self.advance();
                Ok(self.ast.push_expr(ExprKind::Number(value), location))
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                if name == "addr" && self.match_token(&TokenKind::LParen) {
                    let operand = self.parse_expression()?;
                    self.expect_rparen("after addr operand")?;
                    return Ok(self.ast.push_expr(ExprKind::AddressOf(operand), location));
                }
                Ok(self.ast.push_expr(ExprKind::Variable(name), location))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                Ok(expr)
            }
            _ => Err(self.error_here("Expected an expression")),
        }
    }
}
