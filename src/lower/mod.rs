//! Lowering contract
//!
//! A code generator plugs in as a [`Backend`]. The lowering functions walk the
//! tree in post-order and hand each node to the backend with its children
//! already lowered, so every node kind maps to exactly one backend method and
//! adding a kind is a compile error in every backend until it is handled.
//!
//! Writable places are lowered through [`lower_address`]: only variables,
//! index expressions, and member accesses have an address; anything else fails
//! with [`LowerError::NotAddressable`].
//!
//! - [`printer`]: S-expression backend (token-free, location-free output)

pub mod printer;

use crate::parser::ast::*;
use crate::types::TypeEnv;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    #[error("expression at line {}, column {} is not addressable", .0.line, .0.column)]
    NotAddressable(SourceLocation),
    #[error("no declaration for struct '{0}'")]
    UnknownStruct(String),
}

/// Lowered form of a match case
#[derive(Debug, Clone, PartialEq)]
pub enum LoweredCase<V> {
    Value(V),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoweredArm<V> {
    pub case: LoweredCase<V>,
    pub body: Vec<V>,
}

/// Code generator interface, one method per node kind
pub trait Backend {
    type Value;
    type Error: From<LowerError>;

    // Expressions
    fn number(&mut self, value: NumberValue, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn variable(&mut self, name: &str, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn address_of(&mut self, place: Self::Value, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn index(&mut self, base: Self::Value, index: Self::Value, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn member(&mut self, object: Self::Value, field: &str, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn unary(&mut self, op: UnOp, operand: Self::Value, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn binary(
        &mut self,
        op: BinOp,
        lhs: Self::Value,
        rhs: Self::Value,
        loc: SourceLocation,
    ) -> Result<Self::Value, Self::Error>;
    fn call(&mut self, callee: &str, args: Vec<Self::Value>, loc: SourceLocation) -> Result<Self::Value, Self::Error>;

    // Places
    fn variable_address(&mut self, name: &str, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn index_address(
        &mut self,
        base: Self::Value,
        index: Self::Value,
        loc: SourceLocation,
    ) -> Result<Self::Value, Self::Error>;
    fn member_address(
        &mut self,
        object_address: Self::Value,
        field: &str,
        loc: SourceLocation,
    ) -> Result<Self::Value, Self::Error>;

    // Statements
    fn expression_statement(&mut self, value: Self::Value, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn declaration(
        &mut self,
        name: &str,
        ty: &TypeExpr,
        init: Option<Self::Value>,
        loc: SourceLocation,
    ) -> Result<Self::Value, Self::Error>;
    fn assignment(
        &mut self,
        target_address: Self::Value,
        value: Self::Value,
        loc: SourceLocation,
    ) -> Result<Self::Value, Self::Error>;
    fn return_statement(&mut self, value: Option<Self::Value>, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn print(&mut self, args: Vec<Self::Value>, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn if_statement(
        &mut self,
        condition: Self::Value,
        then_branch: Vec<Self::Value>,
        else_branch: Option<Vec<Self::Value>>,
        loc: SourceLocation,
    ) -> Result<Self::Value, Self::Error>;
    fn for_range(
        &mut self,
        var: &str,
        start: Self::Value,
        end: Self::Value,
        step: Option<Self::Value>,
        body: Vec<Self::Value>,
        loc: SourceLocation,
    ) -> Result<Self::Value, Self::Error>;
    fn while_loop(
        &mut self,
        condition: Self::Value,
        body: Vec<Self::Value>,
        loc: SourceLocation,
    ) -> Result<Self::Value, Self::Error>;
    fn do_while(
        &mut self,
        body: Vec<Self::Value>,
        condition: Self::Value,
        loc: SourceLocation,
    ) -> Result<Self::Value, Self::Error>;
    fn break_statement(&mut self, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn continue_statement(&mut self, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn match_statement(
        &mut self,
        scrutinee: Self::Value,
        arms: Vec<LoweredArm<Self::Value>>,
        loc: SourceLocation,
    ) -> Result<Self::Value, Self::Error>;

    // Items
    fn function(&mut self, proto: &Prototype, body: Vec<Self::Value>) -> Result<Self::Value, Self::Error>;
    fn extern_function(&mut self, proto: &Prototype) -> Result<Self::Value, Self::Error>;
    fn type_alias(&mut self, name: &str, target: &TypeExpr, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
    fn struct_decl(&mut self, decl: &StructDecl) -> Result<Self::Value, Self::Error>;
    fn top_level(&mut self, stmt: Self::Value, loc: SourceLocation) -> Result<Self::Value, Self::Error>;
}

/// Lower a top-level item. Struct items are looked up in `env`.
pub fn lower_item<B: Backend>(
    backend: &mut B,
    ast: &Ast,
    env: &TypeEnv,
    item: &Item,
) -> Result<B::Value, B::Error> {
    match &item.kind {
        ItemKind::Function { proto, body } => {
            let body = lower_suite(backend, ast, body)?;
            backend.function(proto, body)
        }
        ItemKind::Extern(proto) => backend.extern_function(proto),
        ItemKind::TypeAlias { name, target } => backend.type_alias(name, target, item.location),
        ItemKind::Struct { name } => {
            let decl = env
                .struct_decl(name)
                .ok_or_else(|| LowerError::UnknownStruct(name.clone()))?;
            backend.struct_decl(decl)
        }
        ItemKind::Statement(stmt) => {
            let stmt = lower_stmt(backend, ast, *stmt)?;
            backend.top_level(stmt, item.location)
        }
    }
}

pub fn lower_suite<B: Backend>(backend: &mut B, ast: &Ast, suite: &Suite) -> Result<Vec<B::Value>, B::Error> {
    suite
        .stmts
        .iter()
        .map(|stmt| lower_stmt(backend, ast, *stmt))
        .collect()
}

pub fn lower_stmt<B: Backend>(backend: &mut B, ast: &Ast, id: StmtId) -> Result<B::Value, B::Error> {
    let stmt = ast.stmt(id);
    let loc = stmt.location;

    match &stmt.kind {
        StmtKind::Expr(expr) => {
            let value = lower_expr(backend, ast, *expr)?;
            backend.expression_statement(value, loc)
        }
        StmtKind::Declaration { name, ty, init } => {
            let init = init.map(|e| lower_expr(backend, ast, e)).transpose()?;
            backend.declaration(name, ty, init, loc)
        }
        StmtKind::Assign { target, value } => {
            let target = lower_address(backend, ast, *target)?;
            let value = lower_expr(backend, ast, *value)?;
            backend.assignment(target, value, loc)
        }
        StmtKind::Return(value) => {
            let value = value.map(|e| lower_expr(backend, ast, e)).transpose()?;
            backend.return_statement(value, loc)
        }
        StmtKind::Print(args) => {
            let args = lower_exprs(backend, ast, args)?;
            backend.print(args, loc)
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let condition = lower_expr(backend, ast, *condition)?;
            let then_branch = lower_suite(backend, ast, then_branch)?;
            let else_branch = else_branch
                .as_ref()
                .map(|suite| lower_suite(backend, ast, suite))
                .transpose()?;
            backend.if_statement(condition, then_branch, else_branch, loc)
        }
        StmtKind::For {
            var,
            start,
            end,
            step,
            body,
        } => {
            let start = lower_expr(backend, ast, *start)?;
            let end = lower_expr(backend, ast, *end)?;
            let step = step.map(|e| lower_expr(backend, ast, e)).transpose()?;
            let body = lower_suite(backend, ast, body)?;
            backend.for_range(var, start, end, step, body, loc)
        }
        StmtKind::While { condition, body } => {
            let condition = lower_expr(backend, ast, *condition)?;
            let body = lower_suite(backend, ast, body)?;
            backend.while_loop(condition, body, loc)
        }
        StmtKind::DoWhile { body, condition } => {
            let body = lower_suite(backend, ast, body)?;
            let condition = lower_expr(backend, ast, *condition)?;
            backend.do_while(body, condition, loc)
        }
        StmtKind::Break => backend.break_statement(loc),
        StmtKind::Continue => backend.continue_statement(loc),
        StmtKind::Match { scrutinee, arms } => {
            let scrutinee = lower_expr(backend, ast, *scrutinee)?;
            let mut lowered = Vec::with_capacity(arms.len());
            for arm in arms {
                let case = match arm.pattern {
                    CasePattern::Value(value) => LoweredCase::Value(lower_expr(backend, ast, value)?),
                    CasePattern::Wildcard => LoweredCase::Wildcard,
                };
                let body = lower_suite(backend, ast, &arm.body)?;
                lowered.push(LoweredArm { case, body });
            }
            backend.match_statement(scrutinee, lowered, loc)
        }
    }
}

pub fn lower_expr<B: Backend>(backend: &mut B, ast: &Ast, id: ExprId) -> Result<B::Value, B::Error> {
    let expr = ast.expr(id);
    let loc = expr.location;

    match &expr.kind {
        ExprKind::Number(value) => backend.number(*value, loc),
        ExprKind::Variable(name) => backend.variable(name, loc),
        ExprKind::AddressOf(place) => {
            let place = lower_address(backend, ast, *place)?;
            backend.address_of(place, loc)
        }
        ExprKind::Index { base, index } => {
            let base = lower_expr(backend, ast, *base)?;
            let index = lower_expr(backend, ast, *index)?;
            backend.index(base, index, loc)
        }
        ExprKind::Member { object, field } => {
            let object = lower_expr(backend, ast, *object)?;
            backend.member(object, field, loc)
        }
        ExprKind::Unary { op, operand } => {
            let operand = lower_expr(backend, ast, *operand)?;
            backend.unary(*op, operand, loc)
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let lhs = lower_expr(backend, ast, *lhs)?;
            let rhs = lower_expr(backend, ast, *rhs)?;
            backend.binary(*op, lhs, rhs, loc)
        }
        ExprKind::Call { callee, args } => {
            let args = lower_exprs(backend, ast, args)?;
            backend.call(callee, args, loc)
        }
    }
}

/// Lower an expression to the address of the place it names
pub fn lower_address<B: Backend>(backend: &mut B, ast: &Ast, id: ExprId) -> Result<B::Value, B::Error> {
    let expr = ast.expr(id);
    let loc = expr.location;

    match &expr.kind {
        ExprKind::Variable(name) => backend.variable_address(name, loc),
        ExprKind::Index { base, index } => {
            // The base is a pointer value; the element address is computed from it
            let base = lower_expr(backend, ast, *base)?;
            let index = lower_expr(backend, ast, *index)?;
            backend.index_address(base, index, loc)
        }
        ExprKind::Member { object, field } => {
            let object = lower_address(backend, ast, *object)?;
            backend.member_address(object, field, loc)
        }
        ExprKind::Number(_)
        | ExprKind::AddressOf(_)
        | ExprKind::Unary { .. }
        | ExprKind::Binary { .. }
        | ExprKind::Call { .. } => Err(LowerError::NotAddressable(loc).into()),
    }
}

fn lower_exprs<B: Backend>(backend: &mut B, ast: &Ast, exprs: &[ExprId]) -> Result<Vec<B::Value>, B::Error> {
    exprs.iter().map(|e| lower_expr(backend, ast, *e)).collect()
}
