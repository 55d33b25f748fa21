//! Declaration parsing implementation
//!
//! This module handles parsing of top-level items:
//!
//! - Function definitions: `def name(params) -> type: suite`
//! - External declarations: `extern def name(params) -> type`
//! - Type aliases: `type Name = type`
//! - Struct declarations: `struct Name:` followed by an indented field list
//! - Type expressions: builtin names, alias/struct names, `ptr[T]`
//!
//! # Grammar
//!
//! ```text
//! item       ::= definition | external | alias | struct | statement
//! definition ::= "def" prototype ":" suite
//! external   ::= "extern" "def" prototype
//! prototype  ::= identifier "(" [param ("," param)*] ")" "->" type
//! param      ::= identifier ":" type
//! alias      ::= "type" identifier "=" type
//! struct     ::= "struct" identifier ":" EOL INDENT (field EOL)+ DEDENT
//! field      ::= identifier ":" type
//! type       ::= builtin | identifier | "ptr" "[" type "]"
//! ```
//!
//! Aliases and structs are entered into the session's [`TypeEnv`] as soon as
//! their declaration is complete; nothing is resolved here.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseResult, Parser};
use crate::types::TypeEnv;
use rustc_hash::FxHashSet;
use tracing::debug;

impl Parser {
    pub(crate) fn parse_item_inner(&mut self, env: &mut TypeEnv) -> ParseResult<Item> {
        match self.current.kind {
            TokenKind::Def => self.parse_definition(),
            TokenKind::Extern => self.parse_extern(),
            TokenKind::Type => self.parse_type_alias(env),
            TokenKind::Struct => self.parse_struct(env),
            TokenKind::Indent => Err(self.error_here("Unexpected indentation")),
            _ => {
                let location = self.current_location();
                let stmt = self.parse_statement()?;
                Ok(Item {
                    kind: ItemKind::Statement(stmt),
                    location,
                })
            }
        }
    }

    /// Parse function definition: def prototype: suite
    fn parse_definition(&mut self) -> ParseResult<Item> {
        let location = self.current_location();
        self.advance(); // consume 'def'

        let proto = self.parse_prototype()?;
        self.expect_colon("after function prototype")?;
        let body = self.parse_suite()?;

        debug!(name = %proto.name, statements = body.stmts.len(), "parsed function");
        Ok(Item {
            kind: ItemKind::Function { proto, body },
            location,
        })
    }

    /// Parse external declaration: extern def prototype
    fn parse_extern(&mut self) -> ParseResult<Item> {
        let location = self.current_location();
        self.advance(); // consume 'extern'

        self.expect_token(&TokenKind::Def, "Expected 'def' after 'extern'")?;
        let proto = self.parse_prototype()?;

        Ok(Item {
            kind: ItemKind::Extern(proto),
            location,
        })
    }

    /// Parse prototype: name(param: type, ...) -> type
    pub(crate) fn parse_prototype(&mut self) -> ParseResult<Prototype> {
        let location = self.current_location();
        let name = self.expect_identifier("Expected function name in prototype")?;

        self.expect_lparen("after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect_rparen("after parameters")?;

        self.expect_token(&TokenKind::Arrow, "Expected '->' and return type in prototype")?;
        let return_type = self.parse_type_expr()?;

        Ok(Prototype {
            name,
            params,
            return_type,
            location,
        })
    }

    /// Parse parameter list: name: type, name: type, ...
    fn parse_parameter_list(&mut self) -> ParseResult<Vec<Param>> {
        let mut params: Vec<Param> = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            let location = self.current_location();
            let name = self.expect_identifier("Expected parameter name")?;
            if params.iter().any(|p| p.name == name) {
                return Err(self.semantic_error(
                    format!("Duplicate parameter '{}'", name),
                    location,
                ));
            }
            self.expect_colon("after parameter name")?;
            let ty = self.parse_type_expr()?;
            params.push(Param { name, ty });

            if self.match_token(&TokenKind::Comma) {
                continue;
            }
            if !self.check(&TokenKind::RParen) {
                return Err(self.error_here("Expected ')' or ',' in parameter list"));
            }
            break;
        }

        Ok(params)
    }

    /// Parse type expression: builtin | name | ptr[type]
    pub(crate) fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        let name = self.expect_identifier("Expected type name")?;

        if name == "ptr" && self.check(&TokenKind::LBracket) {
            self.advance(); // consume '['
            let elem = self.parse_type_expr()?;
            self.expect_token(&TokenKind::RBracket, "Expected ']' after pointer element type")?;
            return Ok(TypeExpr::pointer_to(elem));
        }

        Ok(match BuiltinType::from_name(&name) {
            Some(builtin) => TypeExpr::Builtin(builtin),
            None => TypeExpr::Named(name),
        })
    }

    /// Parse type alias: type Name = type
    fn parse_type_alias(&mut self, env: &mut TypeEnv) -> ParseResult<Item> {
        let location = self.current_location();
        self.advance(); // consume 'type'

        let name_location = self.current_location();
        let name = self.expect_identifier("Expected alias name after 'type'")?;
        if env.has_struct(&name) {
            return Err(self.semantic_error(
                format!("Type '{}' is already defined as a struct", name),
                name_location,
            ));
        }
        self.expect_token(&TokenKind::Assign, "Expected '=' in type alias declaration")?;
        let target = self.parse_type_expr()?;

        if !self.at_statement_end() {
            return Err(self.error_here("Expected newline after type alias"));
        }

        // Redeclaring an alias replaces it
        debug!(%name, %target, "declared type alias");
        env.declare_alias(&name, target.clone());

        Ok(Item {
            kind: ItemKind::TypeAlias { name, target },
            location,
        })
    }

    /// Parse struct declaration:
    ///
    /// ```text
    /// struct Name:
    ///     field: type
    ///     ...
    /// ```
    fn parse_struct(&mut self, env: &mut TypeEnv) -> ParseResult<Item> {
        let location = self.current_location();
        self.advance(); // consume 'struct'

        let name_location = self.current_location();
        let name = self.expect_identifier("Expected struct name after 'struct'")?;
        if env.has_struct(&name) {
            return Err(self.semantic_error(
                format!("Struct '{}' is already defined", name),
                name_location,
            ));
        }
        // Aliases are looked up before structs, so the struct would be unreachable
        if env.alias(&name).is_some() {
            return Err(self.semantic_error(
                format!("Type '{}' is already defined as an alias", name),
                name_location,
            ));
        }

        self.expect_colon("after struct name")?;
        self.expect_token(&TokenKind::Eol, "Expected newline after struct header")?;
        self.expect_token(&TokenKind::Indent, "Expected indented struct field list")?;

        let mut fields: Vec<Field> = Vec::new();
        let mut seen = FxHashSet::default();
        loop {
            while self.match_token(&TokenKind::Eol) {}
            if self.check(&TokenKind::Dedent) || self.check(&TokenKind::Eof) {
                break;
            }

            let field_location = self.current_location();
            let field_name = self.expect_identifier("Expected field name in struct")?;
            if !seen.insert(field_name.clone()) {
                return Err(self.semantic_error(
                    format!("Duplicate field '{}' in struct '{}'", field_name, name),
                    field_location,
                ));
            }
            self.expect_colon("after struct field name")?;
            let ty = self.parse_type_expr()?;

            if !matches!(self.current.kind, TokenKind::Eol | TokenKind::Dedent) {
                return Err(self.error_here("Expected newline after struct field"));
            }
            fields.push(Field {
                name: field_name,
                ty,
            });
        }

        if fields.is_empty() {
            return Err(self.semantic_error(
                format!("Struct '{}' must declare at least one field", name),
                name_location,
            ));
        }
        self.expect_token(&TokenKind::Dedent, "Expected end of struct field list")?;

        debug!(%name, fields = fields.len(), "declared struct");
        env.declare_struct(StructDecl {
            name: name.clone(),
            fields,
            location,
        });

        Ok(Item {
            kind: ItemKind::Struct { name },
            location,
        })
    }
}
