//! S-expression backend
//!
//! Renders items as nested, location-free S-expressions, e.g.
//!
//! ```text
//! (def add ((x i32) (y i32)) i32 (block (return (+ x y))))
//! ```
//!
//! Two trees print identically exactly when they have the same shape, which
//! makes the printer useful for `--emit ast` and for structural comparisons.

use super::{Backend, LowerError, LoweredArm, LoweredCase};
use crate::parser::ast::*;

#[derive(Debug, Clone, Copy, Default)]
pub struct SexprPrinter;

impl SexprPrinter {
    pub fn new() -> Self {
        SexprPrinter
    }
}

fn list(head: &str, parts: impl IntoIterator<Item = String>) -> String {
    let mut out = format!("({}", head);
    for part in parts {
        out.push(' ');
        out.push_str(&part);
    }
    out.push(')');
    out
}

fn block(stmts: Vec<String>) -> String {
    list("block", stmts)
}

fn params(proto: &Prototype) -> String {
    let params: Vec<String> = proto
        .params
        .iter()
        .map(|p| format!("({} {})", p.name, p.ty))
        .collect();
    format!("({})", params.join(" "))
}

type PrintResult = Result<String, LowerError>;

impl Backend for SexprPrinter {
    type Value = String;
    type Error = LowerError;

    fn number(&mut self, value: NumberValue, _loc: SourceLocation) -> PrintResult {
        Ok(match value {
            NumberValue::Int(n) => n.to_string(),
            NumberValue::Float(f) => format!("{:?}", f),
        })
    }

    fn variable(&mut self, name: &str, _loc: SourceLocation) -> PrintResult {
        Ok(name.to_string())
    }

    fn address_of(&mut self, place: String, _loc: SourceLocation) -> PrintResult {
        Ok(list("addr", [place]))
    }

    fn index(&mut self, base: String, index: String, _loc: SourceLocation) -> PrintResult {
        Ok(list("index", [base, index]))
    }

    fn member(&mut self, object: String, field: &str, _loc: SourceLocation) -> PrintResult {
        Ok(list(".", [object, field.to_string()]))
    }

    fn unary(&mut self, op: UnOp, operand: String, _loc: SourceLocation) -> PrintResult {
        Ok(list(op.symbol(), [operand]))
    }

    fn binary(&mut self, op: BinOp, lhs: String, rhs: String, _loc: SourceLocation) -> PrintResult {
        Ok(list(op.symbol(), [lhs, rhs]))
    }

    fn call(&mut self, callee: &str, args: Vec<String>, _loc: SourceLocation) -> PrintResult {
        Ok(list("call", std::iter::once(callee.to_string()).chain(args)))
    }

    fn variable_address(&mut self, name: &str, _loc: SourceLocation) -> PrintResult {
        Ok(name.to_string())
    }

    fn index_address(&mut self, base: String, index: String, _loc: SourceLocation) -> PrintResult {
        Ok(list("index", [base, index]))
    }

    fn member_address(&mut self, object_address: String, field: &str, _loc: SourceLocation) -> PrintResult {
        Ok(list(".", [object_address, field.to_string()]))
    }

    fn expression_statement(&mut self, value: String, _loc: SourceLocation) -> PrintResult {
        Ok(value)
    }

    fn declaration(
        &mut self,
        name: &str,
        ty: &TypeExpr,
        init: Option<String>,
        _loc: SourceLocation,
    ) -> PrintResult {
        Ok(list("let", [name.to_string(), ty.to_string()].into_iter().chain(init)))
    }

    fn assignment(&mut self, target_address: String, value: String, _loc: SourceLocation) -> PrintResult {
        Ok(list("=", [target_address, value]))
    }

    fn return_statement(&mut self, value: Option<String>, _loc: SourceLocation) -> PrintResult {
        Ok(list("return", value))
    }

    fn print(&mut self, args: Vec<String>, _loc: SourceLocation) -> PrintResult {
        Ok(list("print", args))
    }

    fn if_statement(
        &mut self,
        condition: String,
        then_branch: Vec<String>,
        else_branch: Option<Vec<String>>,
        _loc: SourceLocation,
    ) -> PrintResult {
        let parts = [condition, block(then_branch)]
            .into_iter()
            .chain(else_branch.map(block));
        Ok(list("if", parts))
    }

    fn for_range(
        &mut self,
        var: &str,
        start: String,
        end: String,
        step: Option<String>,
        body: Vec<String>,
        _loc: SourceLocation,
    ) -> PrintResult {
        let parts = [var.to_string(), start, end]
            .into_iter()
            .chain(step)
            .chain(std::iter::once(block(body)));
        Ok(list("for", parts))
    }

    fn while_loop(&mut self, condition: String, body: Vec<String>, _loc: SourceLocation) -> PrintResult {
        Ok(list("while", [condition, block(body)]))
    }

    fn do_while(&mut self, body: Vec<String>, condition: String, _loc: SourceLocation) -> PrintResult {
        Ok(list("do", [block(body), condition]))
    }

    fn break_statement(&mut self, _loc: SourceLocation) -> PrintResult {
        Ok("(break)".to_string())
    }

    fn continue_statement(&mut self, _loc: SourceLocation) -> PrintResult {
        Ok("(continue)".to_string())
    }

    fn match_statement(
        &mut self,
        scrutinee: String,
        arms: Vec<LoweredArm<String>>,
        _loc: SourceLocation,
    ) -> PrintResult {
        let arms = arms.into_iter().map(|arm| {
            let case = match arm.case {
                LoweredCase::Value(v) => v,
                LoweredCase::Wildcard => "_".to_string(),
            };
            list("case", [case, block(arm.body)])
        });
        Ok(list("match", std::iter::once(scrutinee).chain(arms)))
    }

    fn function(&mut self, proto: &Prototype, body: Vec<String>) -> PrintResult {
        Ok(list(
            "def",
            [
                proto.name.clone(),
                params(proto),
                proto.return_type.to_string(),
                block(body),
            ],
        ))
    }

    fn extern_function(&mut self, proto: &Prototype) -> PrintResult {
        Ok(list(
            "extern",
            [proto.name.clone(), params(proto), proto.return_type.to_string()],
        ))
    }

    fn type_alias(&mut self, name: &str, target: &TypeExpr, _loc: SourceLocation) -> PrintResult {
        Ok(list("type", [name.to_string(), target.to_string()]))
    }

    fn struct_decl(&mut self, decl: &StructDecl) -> PrintResult {
        let fields = decl.fields.iter().map(|f| format!("({} {})", f.name, f.ty));
        Ok(list("struct", std::iter::once(decl.name.clone()).chain(fields)))
    }

    fn top_level(&mut self, stmt: String, _loc: SourceLocation) -> PrintResult {
        Ok(stmt)
    }
}
