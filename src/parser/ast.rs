//! Syntax tree definitions
//!
//! Every expression and statement lives in one [`Ast`] arena and refers to its
//! children by index. Type expressions are small owned values; struct and alias
//! names inside them are resolved later against the session's type tables.

use std::fmt;

/// Source location information for error reporting (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Index of an expression node in the [`Ast`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

/// Index of a statement node in the [`Ast`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId(usize);

/// Builtin scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Void,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl BuiltinType {
    pub fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "void" => BuiltinType::Void,
            "i8" => BuiltinType::I8,
            "i16" => BuiltinType::I16,
            "i32" => BuiltinType::I32,
            "i64" => BuiltinType::I64,
            "u8" => BuiltinType::U8,
            "u16" => BuiltinType::U16,
            "u32" => BuiltinType::U32,
            "u64" => BuiltinType::U64,
            "f32" => BuiltinType::F32,
            "f64" => BuiltinType::F64,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Void => "void",
            BuiltinType::I8 => "i8",
            BuiltinType::I16 => "i16",
            BuiltinType::I32 => "i32",
            BuiltinType::I64 => "i64",
            BuiltinType::U8 => "u8",
            BuiltinType::U16 => "u16",
            BuiltinType::U32 => "u32",
            BuiltinType::U64 => "u64",
            BuiltinType::F32 => "f32",
            BuiltinType::F64 => "f64",
        }
    }
}

/// Parsed (unresolved) type expression: `i32`, `Point`, `ptr[Point]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Builtin(BuiltinType),
    /// Alias or struct name, looked up in the session's type tables
    Named(String),
    Pointer(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn pointer_to(elem: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(elem))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Builtin(b) => write!(f, "{}", b.name()),
            TypeExpr::Named(name) => write!(f, "{}", name),
            TypeExpr::Pointer(elem) => write!(f, "ptr[{}]", elem),
        }
    }
}

/// Numeric literal payload (character literals are integers)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(i64),
    Float(f64),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,    // -x
    Not,    // !x, not x
    BitNot, // ~x
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "not",
            UnOp::BitNot => "~",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(NumberValue),
    Variable(String),
    AddressOf(ExprId),
    Index { base: ExprId, index: ExprId },
    Member { object: ExprId, field: String },
    Unary { op: UnOp, operand: ExprId },
    Binary { op: BinOp, lhs: ExprId, rhs: ExprId },
    Call { callee: String, args: Vec<ExprId> },
}

impl ExprKind {
    /// Whether the expression can produce a location to be written to
    pub fn is_addressable(&self) -> bool {
        matches!(
            self,
            ExprKind::Variable(_) | ExprKind::Index { .. } | ExprKind::Member { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: SourceLocation,
}

/// A statement body: one inline statement or an indented block
#[derive(Debug, Clone, PartialEq)]
pub struct Suite {
    pub stmts: Vec<StmtId>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CasePattern {
    Value(ExprId),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: CasePattern,
    pub body: Suite,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(ExprId),
    Declaration {
        name: String,
        ty: TypeExpr,
        init: Option<ExprId>,
    },
    Assign {
        target: ExprId,
        value: ExprId,
    },
    Return(Option<ExprId>),
    Print(Vec<ExprId>),
    If {
        condition: ExprId,
        then_branch: Suite,
        else_branch: Option<Suite>,
    },
    For {
        var: String,
        start: ExprId,
        end: ExprId,
        step: Option<ExprId>,
        body: Suite,
    },
    While {
        condition: ExprId,
        body: Suite,
    },
    DoWhile {
        body: Suite,
        condition: ExprId,
    },
    Break,
    Continue,
    Match {
        scrutinee: ExprId,
        arms: Vec<MatchArm>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: SourceLocation,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
}

/// `name(param: type, ...) -> type`
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeExpr,
    pub location: SourceLocation,
}

/// Struct field declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeExpr,
}

/// Struct declaration as written; stored in the session's struct table
#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<Field>,
    pub location: SourceLocation,
}

impl StructDecl {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Function { proto: Prototype, body: Suite },
    Extern(Prototype),
    TypeAlias { name: String, target: TypeExpr },
    /// Declaration lives in the struct table, keyed by name
    Struct { name: String },
    Statement(StmtId),
}

/// Top-level construct
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    pub location: SourceLocation,
}

/// Arena rollback point, taken before parsing an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstMark {
    exprs: usize,
    stmts: usize,
}

/// Node arena
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn push_expr(&mut self, kind: ExprKind, location: SourceLocation) -> ExprId {
        self.exprs.push(Expr { kind, location });
        ExprId(self.exprs.len() - 1)
    }

    pub fn push_stmt(&mut self, kind: StmtKind, location: SourceLocation) -> StmtId {
        self.stmts.push(Stmt { kind, location });
        StmtId(self.stmts.len() - 1)
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    pub fn mark(&self) -> AstMark {
        AstMark {
            exprs: self.exprs.len(),
            stmts: self.stmts.len(),
        }
    }

    /// Drop every node created after `mark` (used when an item fails to parse)
    pub fn rollback(&mut self, mark: AstMark) {
        self.exprs.truncate(mark.exprs);
        self.stmts.truncate(mark.stmts);
    }

    pub fn clear(&mut self) {
        self.exprs.clear();
        self.stmts.clear();
    }
}
