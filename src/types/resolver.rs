//! Type expression resolution
//!
//! Resolution expands aliases and lays out structs on first use. A visited
//! set of alias and struct names guards against cycles:
//!
//! - an alias reached again while it is being expanded is an alias cycle
//!   (`type A = B`, `type B = A`)
//! - a struct reached again by value while its own fields are being resolved
//!   contains itself (`struct S: next: S`)
//! - a struct reached again behind `ptr[...]` is fine: the pointer refers to
//!   the (possibly still incomplete) layout
//!
//! A struct first reached behind `ptr[...]` is only registered; its fields are
//! laid out once the current resolution finishes, starting from an empty
//! visited set. Whether `struct A: b: ptr[B]` / `struct B: a: A` resolves does
//! not depend on which of the two is asked for first.
//!
//! Alias names are tracked per struct layout: a struct's fields start with no
//! aliases in progress, so `type P = ptr[S]` used inside `struct S` is not a
//! cycle.
//!
//! A failed resolution leaves no partial layouts behind.

use super::{align_up, ResolvedType, StructId, StructLayout, TypeEnv, LayoutField};
use crate::parser::ast::TypeExpr;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("Unknown type alias: {0}")]
    UnknownType(String),
    #[error("Alias cycle detected at type: {0}")]
    AliasCycle(String),
    #[error("Struct '{0}' contains itself by value")]
    RecursiveStruct(String),
}

/// Names currently being expanded
#[derive(Debug, Default)]
struct Visiting {
    aliases: FxHashSet<String>,
    structs: FxHashSet<String>,
    /// Structs registered behind a pointer, fields not laid out yet
    deferred: Vec<String>,
}

impl TypeEnv {
    /// Resolve a type expression, laying out any struct it reaches
    pub fn resolve(&mut self, ty: &TypeExpr) -> Result<ResolvedType, TypeError> {
        let mark = self.layouts.len();
        let mut visited = Visiting::default();
        let result = match self.resolve_in(ty, &mut visited, false) {
            Ok(resolved) => self.complete_deferred(visited.deferred).map(|()| resolved),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            debug!(%ty, error = %err, "type resolution failed");
            self.rollback_layouts(mark);
        }
        result
    }

    /// Resolve a struct by name
    pub fn resolve_struct(&mut self, name: &str) -> Result<StructId, TypeError> {
        match self.resolve(&TypeExpr::Named(name.to_string()))? {
            ResolvedType::Struct(id) => Ok(id),
            _ => Err(TypeError::UnknownType(name.to_string())),
        }
    }

    /// Lay out every struct first reached behind a pointer
    fn complete_deferred(&mut self, mut queue: Vec<String>) -> Result<(), TypeError> {
        while let Some(name) = queue.pop() {
            let mut visited = Visiting::default();
            self.resolve_named_struct(&name, &mut visited, false)?;
            queue.append(&mut visited.deferred);
        }
        Ok(())
    }

    fn resolve_in(
        &mut self,
        ty: &TypeExpr,
        visited: &mut Visiting,
        behind_pointer: bool,
    ) -> Result<ResolvedType, TypeError> {
        match ty {
            TypeExpr::Builtin(builtin) => Ok(ResolvedType::from_builtin(*builtin)),
            TypeExpr::Pointer(elem) => {
                let elem = self.resolve_in(elem, visited, true)?;
                Ok(ResolvedType::pointer_to(elem))
            }
            TypeExpr::Named(name) => {
                if let Some(target) = self.aliases.get(name).cloned() {
                    if !visited.aliases.insert(name.clone()) {
                        return Err(TypeError::AliasCycle(name.clone()));
                    }
                    trace!(%name, %target, "expanding alias");
                    let resolved = self.resolve_in(&target, visited, behind_pointer);
                    visited.aliases.remove(name);
                    resolved
                } else if self.structs.contains_key(name) {
                    self.resolve_named_struct(name, visited, behind_pointer)
                } else {
                    Err(TypeError::UnknownType(name.clone()))
                }
            }
        }
    }

    fn resolve_named_struct(
        &mut self,
        name: &str,
        visited: &mut Visiting,
        behind_pointer: bool,
    ) -> Result<ResolvedType, TypeError> {
        if visited.structs.contains(name) && !behind_pointer {
            return Err(TypeError::RecursiveStruct(name.to_string()));
        }

        let Some(entry) = self.structs.get(name) else {
            return Err(TypeError::UnknownType(name.to_string()));
        };
        let decl = entry.decl.clone();
        let existing = entry.layout;
        let id = match existing {
            Some(id) if self.layouts[id.0].complete || behind_pointer => {
                return Ok(ResolvedType::Struct(id));
            }
            // Incomplete and not on the visited path: deferred, lay it out now
            Some(id) => id,
            None => {
                // Register the incomplete layout first so pointers back to
                // this struct resolve while its fields are laid out
                let id = StructId(self.layouts.len());
                self.layouts.push(StructLayout {
                    name: decl.name.clone(),
                    fields: Vec::new(),
                    size: 0,
                    align: 1,
                    complete: false,
                });
                if let Some(entry) = self.structs.get_mut(name) {
                    entry.layout = Some(id);
                }
                if behind_pointer {
                    trace!(struct_name = %name, "deferring struct layout");
                    visited.deferred.push(name.to_string());
                    return Ok(ResolvedType::Struct(id));
                }
                id
            }
        };

        visited.structs.insert(name.to_string());
        let outer_aliases = std::mem::take(&mut visited.aliases);
        let mut fields = Vec::with_capacity(decl.fields.len());
        let mut offset = 0;
        let mut align = 1;
        for field in &decl.fields {
            let ty = match self.resolve_in(&field.ty, visited, false) {
                Ok(ty) => ty,
                Err(err) => {
                    visited.aliases = outer_aliases;
                    return Err(err);
                }
            };
            let field_align = self.align_of(&ty);
            offset = align_up(offset, field_align);
            let size = self.size_of(&ty);
            fields.push(LayoutField {
                name: field.name.clone(),
                ty,
                offset,
            });
            offset += size;
            align = align.max(field_align);
        }
        visited.structs.remove(name);
        visited.aliases = outer_aliases;

        let layout = &mut self.layouts[id.0];
        layout.fields = fields;
        layout.size = align_up(offset, align);
        layout.align = align;
        layout.complete = true;
        debug!(struct_name = %name, size = layout.size, align, "laid out struct");

        Ok(ResolvedType::Struct(id))
    }

    /// Forget layouts created after `mark`
    fn rollback_layouts(&mut self, mark: usize) {
        self.layouts.truncate(mark);
        for entry in self.structs.values_mut() {
            if entry.layout.is_some_and(|id| id.0 >= mark) {
                entry.layout = None;
            }
        }
    }
}
