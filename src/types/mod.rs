//! Type tables and resolved types
//!
//! This module provides the semantic side of types:
//! - [`TypeEnv`]: per-session alias and struct tables, plus computed layouts
//! - [`ResolvedType`]: a fully resolved descriptor (aliases expanded, structs
//!   referenced by [`StructId`])
//! - [`resolver`]: turning [`TypeExpr`]s into [`ResolvedType`]s with cycle detection
//! - [`check`]: the boundary checks run after each top-level item
//!
//! # Type Sizes
//!
//! Sizes follow the natural machine layout:
//! - `iN`/`uN`: N / 8 bytes, `f32`: 4 bytes, `f64`: 8 bytes
//! - `bool`: 1 byte
//! - `ptr[T]`: 8 bytes (regardless of pointee type)
//! - `void`: 0 bytes
//! - `struct`: fields in declaration order, each at an offset aligned to its
//!   own alignment; total size rounded up to the struct's alignment

pub mod check;
pub mod resolver;

pub use check::{Checker, Signature, SymbolTable};
pub use resolver::TypeError;

use crate::parser::ast::{BuiltinType, StructDecl, TypeExpr};
use rustc_hash::FxHashMap;

/// Size and alignment of a pointer
pub const POINTER_SIZE: usize = 8;

/// Aliases every new session starts with
pub const DEFAULT_ALIASES: &[(&str, BuiltinType)] = &[
    ("int", BuiltinType::I32),
    ("char", BuiltinType::I8),
    ("float", BuiltinType::F32),
    ("double", BuiltinType::F64),
    ("long", BuiltinType::I64),
    ("size_t", BuiltinType::U64),
];

/// Index of a computed struct layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedType {
    Void,
    /// Result of comparisons and logical operators
    Bool,
    Int { bits: u8, signed: bool },
    Float { bits: u8 },
    Pointer(Box<ResolvedType>),
    Struct(StructId),
}

impl ResolvedType {
    pub fn from_builtin(builtin: BuiltinType) -> Self {
        match builtin {
            BuiltinType::Void => ResolvedType::Void,
            BuiltinType::I8 => ResolvedType::Int { bits: 8, signed: true },
            BuiltinType::I16 => ResolvedType::Int { bits: 16, signed: true },
            BuiltinType::I32 => ResolvedType::Int { bits: 32, signed: true },
            BuiltinType::I64 => ResolvedType::Int { bits: 64, signed: true },
            BuiltinType::U8 => ResolvedType::Int { bits: 8, signed: false },
            BuiltinType::U16 => ResolvedType::Int { bits: 16, signed: false },
            BuiltinType::U32 => ResolvedType::Int { bits: 32, signed: false },
            BuiltinType::U64 => ResolvedType::Int { bits: 64, signed: false },
            BuiltinType::F32 => ResolvedType::Float { bits: 32 },
            BuiltinType::F64 => ResolvedType::Float { bits: 64 },
        }
    }

    pub fn pointer_to(elem: ResolvedType) -> Self {
        ResolvedType::Pointer(Box::new(elem))
    }

    /// Integers and bool
    pub fn is_integer_like(&self) -> bool {
        matches!(self, ResolvedType::Int { .. } | ResolvedType::Bool)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ResolvedType::Float { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, ResolvedType::Pointer(_))
    }
}

/// Field with its resolved type and byte offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutField {
    pub name: String,
    pub ty: ResolvedType,
    pub offset: usize,
}

/// Computed struct layout. `complete` is false only while a resolution is
/// still laying out the struct's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<LayoutField>,
    pub size: usize,
    pub align: usize,
    pub complete: bool,
}

impl StructLayout {
    pub fn field(&self, name: &str) -> Option<&LayoutField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StructEntry {
    pub(crate) decl: StructDecl,
    pub(crate) layout: Option<StructId>,
}

/// Alias and struct tables for one session
#[derive(Debug, Clone)]
pub struct TypeEnv {
    pub(crate) aliases: FxHashMap<String, TypeExpr>,
    pub(crate) structs: FxHashMap<String, StructEntry>,
    pub(crate) layouts: Vec<StructLayout>,
}

impl Default for TypeEnv {
    fn default() -> Self {
        TypeEnv::new()
    }
}

impl TypeEnv {
    /// Tables holding only the default aliases
    pub fn new() -> Self {
        let mut env = TypeEnv::empty();
        env.install_defaults();
        env
    }

    /// Tables with no aliases at all
    pub fn empty() -> Self {
        TypeEnv {
            aliases: FxHashMap::default(),
            structs: FxHashMap::default(),
            layouts: Vec::new(),
        }
    }

    /// Back to the state of a fresh session
    pub fn reset(&mut self) {
        self.aliases.clear();
        self.structs.clear();
        self.layouts.clear();
        self.install_defaults();
    }

    fn install_defaults(&mut self) {
        for (name, builtin) in DEFAULT_ALIASES {
            self.aliases
                .insert((*name).to_string(), TypeExpr::Builtin(*builtin));
        }
    }

    /// Declare or replace an alias
    pub fn declare_alias(&mut self, name: &str, target: TypeExpr) {
        self.aliases.insert(name.to_string(), target);
    }

    pub fn alias(&self, name: &str) -> Option<&TypeExpr> {
        self.aliases.get(name)
    }

    /// Declare a struct; false if the name is taken
    pub fn declare_struct(&mut self, decl: StructDecl) -> bool {
        if self.structs.contains_key(&decl.name) {
            return false;
        }
        self.structs
            .insert(decl.name.clone(), StructEntry { decl, layout: None });
        true
    }

    pub fn has_struct(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        self.structs.get(name).map(|entry| &entry.decl)
    }

    pub fn layout(&self, id: StructId) -> &StructLayout {
        &self.layouts[id.0]
    }

    /// Layout of a struct that has already been resolved
    pub fn layout_of(&self, name: &str) -> Option<&StructLayout> {
        let id = self.structs.get(name)?.layout?;
        Some(self.layout(id))
    }

    /// Size of a type in bytes
    pub fn size_of(&self, ty: &ResolvedType) -> usize {
        match ty {
            ResolvedType::Void => 0,
            ResolvedType::Bool => 1,
            ResolvedType::Int { bits, .. } | ResolvedType::Float { bits } => {
                usize::from(*bits) / 8
            }
            ResolvedType::Pointer(_) => POINTER_SIZE,
            ResolvedType::Struct(id) => self.layout(*id).size,
        }
    }

    /// Alignment of a type in bytes
    pub fn align_of(&self, ty: &ResolvedType) -> usize {
        match ty {
            ResolvedType::Struct(id) => self.layout(*id).align,
            other => self.size_of(other).max(1),
        }
    }

    /// Human-readable name of a resolved type
    pub fn describe(&self, ty: &ResolvedType) -> String {
        match ty {
            ResolvedType::Void => "void".to_string(),
            ResolvedType::Bool => "bool".to_string(),
            ResolvedType::Int { bits, signed: true } => format!("i{}", bits),
            ResolvedType::Int { bits, signed: false } => format!("u{}", bits),
            ResolvedType::Float { bits } => format!("f{}", bits),
            ResolvedType::Pointer(elem) => format!("ptr[{}]", self.describe(elem)),
            ResolvedType::Struct(id) => self.layout(*id).name.clone(),
        }
    }
}

/// Round `offset` up to a multiple of `align`
pub(crate) fn align_up(offset: usize, align: usize) -> usize {
    if align <= 1 {
        offset
    } else {
        offset.div_ceil(align) * align
    }
}
