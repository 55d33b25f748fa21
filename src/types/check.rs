//! Boundary checks run after each top-level item
//!
//! The checker resolves every type expression an item mentions and walks its
//! expressions with a best-effort type hint:
//!
//! - Literals have their natural type (`i64` for integers and characters,
//!   `f64` for floats)
//! - Variables are looked up in the enclosing scopes, then in the globals
//! - Comparisons and logical operators yield `bool`
//! - Arithmetic yields the float operand's type if either side is a float,
//!   otherwise the left operand's type
//! - Indexing a pointer yields its element type; member access yields the
//!   field's type
//! - Calls yield the callee's return type
//!
//! Names the checker cannot see (undeclared variables, unknown functions)
//! hint to `None` rather than failing; only contradictions with known types
//! are reported.

use super::{ResolvedType, TypeEnv};
use crate::parser::ast::*;
use crate::parser::diagnostics::Diagnostic;
use rustc_hash::FxHashMap;
use tracing::trace;

/// Resolved function type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ResolvedType>,
    pub return_type: ResolvedType,
}

/// Functions and globals declared so far in a session
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub functions: FxHashMap<String, Signature>,
    pub globals: FxHashMap<String, ResolvedType>,
}

impl SymbolTable {
    pub fn clear(&mut self) {
        self.functions.clear();
        self.globals.clear();
    }
}

type CheckResult<T> = Result<T, Diagnostic>;

/// Checks one item at a time against the session tables
pub struct Checker<'a> {
    env: &'a mut TypeEnv,
    symbols: &'a mut SymbolTable,
    ast: &'a Ast,
    scopes: Vec<FxHashMap<String, ResolvedType>>,
    /// Function whose body is being checked, visible for recursive calls
    current_function: Option<(String, Signature)>,
    loop_depth: usize,
}

impl<'a> Checker<'a> {
    pub fn new(env: &'a mut TypeEnv, symbols: &'a mut SymbolTable, ast: &'a Ast) -> Self {
        Checker {
            env,
            symbols,
            ast,
            scopes: Vec::new(),
            current_function: None,
            loop_depth: 0,
        }
    }

    /// Check an item; on success its function signature or global is recorded
    pub fn check_item(&mut self, item: &Item) -> CheckResult<()> {
        match &item.kind {
            ItemKind::Function { proto, body } => {
                let signature = self.signature(proto)?;
                self.current_function = Some((proto.name.clone(), signature.clone()));

                let mut params = FxHashMap::default();
                for (param, ty) in proto.params.iter().zip(&signature.params) {
                    params.insert(param.name.clone(), ty.clone());
                }
                self.scopes.push(params);
                let result = self.check_suite(body);
                self.scopes.pop();
                self.current_function = None;
                result?;

                self.symbols.functions.insert(proto.name.clone(), signature);
            }
            ItemKind::Extern(proto) => {
                let signature = self.signature(proto)?;
                self.symbols.functions.insert(proto.name.clone(), signature);
            }
            // Aliases and structs resolve lazily at their first use
            ItemKind::TypeAlias { .. } | ItemKind::Struct { .. } => {}
            ItemKind::Statement(stmt) => {
                // Top-level declarations become globals
                self.scopes.push(FxHashMap::default());
                let result = self.check_stmt(*stmt);
                let declared = self.scopes.pop().unwrap_or_default();
                result?;
                self.symbols.globals.extend(declared);
            }
        }
        Ok(())
    }

    fn signature(&mut self, proto: &Prototype) -> CheckResult<Signature> {
        let mut params = Vec::with_capacity(proto.params.len());
        for param in &proto.params {
            params.push(self.resolve(&param.ty, proto.location)?);
        }
        let return_type = self.resolve(&proto.return_type, proto.location)?;
        Ok(Signature {
            params,
            return_type,
        })
    }

    fn resolve(&mut self, ty: &TypeExpr, location: SourceLocation) -> CheckResult<ResolvedType> {
        self.env
            .resolve(ty)
            .map_err(|err| Diagnostic::semantic(err.to_string(), location))
    }

    fn check_suite(&mut self, suite: &Suite) -> CheckResult<()> {
        self.scopes.push(FxHashMap::default());
        let result = suite.stmts.iter().try_for_each(|stmt| self.check_stmt(*stmt));
        self.scopes.pop();
        result
    }

    fn declare_local(&mut self, name: &str, ty: ResolvedType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    fn check_stmt(&mut self, id: StmtId) -> CheckResult<()> {
        let ast = self.ast;
        let stmt = ast.stmt(id);
        trace!(line = stmt.location.line, column = stmt.location.column, "check statement");

        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.type_hint(*expr)?;
            }
            StmtKind::Declaration { name, ty, init } => {
                let resolved = self.resolve(ty, stmt.location)?;
                if let Some(init) = init {
                    self.type_hint(*init)?;
                }
                self.declare_local(name, resolved);
            }
            StmtKind::Assign { target, value } => {
                self.type_hint(*target)?;
                self.type_hint(*value)?;
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.type_hint(*value)?;
                }
            }
            StmtKind::Print(args) => {
                for arg in args {
                    self.type_hint(*arg)?;
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.type_hint(*condition)?;
                self.check_suite(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_suite(else_branch)?;
                }
            }
            StmtKind::For {
                var,
                start,
                end,
                step,
                body,
            } => {
                let var_type = self.type_hint(*start)?;
                self.type_hint(*end)?;
                if let Some(step) = step {
                    self.type_hint(*step)?;
                }

                let mut scope = FxHashMap::default();
                if let Some(ty) = var_type {
                    scope.insert(var.clone(), ty);
                }
                self.scopes.push(scope);
                let result = self.check_loop_body(body);
                self.scopes.pop();
                result?;
            }
            StmtKind::While { condition, body } => {
                self.type_hint(*condition)?;
                self.check_loop_body(body)?;
            }
            StmtKind::DoWhile { body, condition } => {
                self.check_loop_body(body)?;
                self.type_hint(*condition)?;
            }
            StmtKind::Break | StmtKind::Continue => {
                if self.loop_depth == 0 {
                    let word = if stmt.kind == StmtKind::Break {
                        "break"
                    } else {
                        "continue"
                    };
                    return Err(Diagnostic::semantic(
                        format!("'{}' outside of a loop", word),
                        stmt.location,
                    ));
                }
            }
            StmtKind::Match { scrutinee, arms } => {
                self.check_match(*scrutinee, arms)?;
            }
        }
        Ok(())
    }

    fn check_loop_body(&mut self, body: &Suite) -> CheckResult<()> {
        self.loop_depth += 1;
        let result = self.check_suite(body);
        self.loop_depth -= 1;
        result
    }

    fn check_match(&mut self, scrutinee: ExprId, arms: &[MatchArm]) -> CheckResult<()> {
        if let Some(ty) = self.type_hint(scrutinee)? {
            if !ty.is_integer_like() {
                return Err(Diagnostic::semantic(
                    format!(
                        "Match scrutinee must be an integer, found {}",
                        self.env.describe(&ty)
                    ),
                    self.ast.expr(scrutinee).location,
                ));
            }
        }

        let mut seen: Vec<i64> = Vec::new();
        for arm in arms {
            if let CasePattern::Value(value) = arm.pattern {
                let constant = self.case_constant(value)?;
                if seen.contains(&constant) {
                    return Err(Diagnostic::semantic(
                        format!("Duplicate case value {} in match", constant),
                        self.ast.expr(value).location,
                    ));
                }
                seen.push(constant);
            }
            self.check_suite(&arm.body)?;
        }
        Ok(())
    }

    /// Case values are integer (or character) literals, optionally negated
    fn case_constant(&self, id: ExprId) -> CheckResult<i64> {
        let expr = self.ast.expr(id);
        match &expr.kind {
            ExprKind::Number(NumberValue::Int(n)) => Ok(*n),
            ExprKind::Unary {
                op: UnOp::Neg,
                operand,
            } => match self.ast.expr(*operand).kind {
                ExprKind::Number(NumberValue::Int(n)) => Ok(n.wrapping_neg()),
                ExprKind::Number(NumberValue::Float(_)) => Err(float_case(expr.location)),
                _ => Err(non_literal_case(expr.location)),
            },
            ExprKind::Number(NumberValue::Float(_)) => Err(float_case(expr.location)),
            _ => Err(non_literal_case(expr.location)),
        }
    }

    fn lookup(&self, name: &str) -> Option<ResolvedType> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.symbols.globals.get(name))
            .cloned()
    }

    fn function(&self, name: &str) -> Option<&Signature> {
        match &self.current_function {
            Some((current, signature)) if current == name => Some(signature),
            _ => self.symbols.functions.get(name),
        }
    }

    /// Best-effort static type of an expression; `None` when unknown
    pub fn type_hint(&mut self, id: ExprId) -> CheckResult<Option<ResolvedType>> {
        let ast = self.ast;
        let expr = ast.expr(id);

        let hint = match &expr.kind {
            ExprKind::Number(NumberValue::Int(_)) => Some(ResolvedType::Int {
                bits: 64,
                signed: true,
            }),
            ExprKind::Number(NumberValue::Float(_)) => Some(ResolvedType::Float { bits: 64 }),
            ExprKind::Variable(name) => self.lookup(name),
            ExprKind::AddressOf(operand) => {
                if !ast.expr(*operand).kind.is_addressable() {
                    return Err(Diagnostic::semantic(
                        "Cannot take the address of a non-addressable expression",
                        expr.location,
                    ));
                }
                self.type_hint(*operand)?.map(ResolvedType::pointer_to)
            }
            ExprKind::Index { base, index } => {
                self.type_hint(*index)?;
                match self.type_hint(*base)? {
                    Some(ResolvedType::Pointer(elem)) => Some(*elem),
                    Some(other) => {
                        return Err(Diagnostic::semantic(
                            format!(
                                "Cannot index a value of type {}",
                                self.env.describe(&other)
                            ),
                            expr.location,
                        ))
                    }
                    None => None,
                }
            }
            ExprKind::Member { object, field } => match self.type_hint(*object)? {
                Some(ResolvedType::Struct(id)) => {
                    let layout = self.env.layout(id);
                    match layout.field(field) {
                        Some(f) => Some(f.ty.clone()),
                        None => {
                            return Err(Diagnostic::semantic(
                                format!("Unknown field '{}' in struct '{}'", field, layout.name),
                                expr.location,
                            ))
                        }
                    }
                }
                Some(other) => {
                    return Err(Diagnostic::semantic(
                        format!(
                            "Member access on non-struct type {}",
                            self.env.describe(&other)
                        ),
                        expr.location,
                    ))
                }
                None => None,
            },
            ExprKind::Unary { op, operand } => {
                let operand = self.type_hint(*operand)?;
                match op {
                    UnOp::Not => Some(ResolvedType::Bool),
                    UnOp::Neg | UnOp::BitNot => operand,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.type_hint(*lhs)?;
                let rhs = self.type_hint(*rhs)?;
                if op.is_comparison() || op.is_logical() {
                    Some(ResolvedType::Bool)
                } else {
                    match (lhs, rhs) {
                        (Some(l), _) if l.is_float() => Some(l),
                        (_, Some(r)) if r.is_float() => Some(r),
                        (l, r) => l.or(r),
                    }
                }
            }
            ExprKind::Call { callee, args } => {
                for arg in args {
                    self.type_hint(*arg)?;
                }
                self.function(callee).map(|sig| sig.return_type.clone())
            }
        };

        Ok(hint)
    }
}

fn float_case(location: SourceLocation) -> Diagnostic {
    Diagnostic::semantic("Match case value must be an integer, found float", location)
}

fn non_literal_case(location: SourceLocation) -> Diagnostic {
    Diagnostic::semantic("Match case value must be an integer literal", location)
}
