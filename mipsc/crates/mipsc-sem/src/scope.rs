//! The scope tree built by the symbol-table pass.
//!
//! One rib per function, plus the global rib holding every function
//! declaration; the source language has no nested blocks, so a rib never
//! needs more than one level below the root (see the design note on scope
//! entry being keyed by function name rather than ordinal child position).

use mipsc_util::{define_idx, index_vec::Idx, IndexVec, Symbol};
use std::collections::HashMap;

define_idx!(pub struct RibId);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RibKind {
    Global,
    Function,
}

/// A function's parameters and locals, keyed by interned name. A function
/// record itself lives in the *parent* rib (global), not this one.
#[derive(Debug, Default)]
pub struct Rib {
    pub bindings: HashMap<Symbol, SymbolRecord>,
    pub parent: Option<RibId>,
    pub kind: RibKind,
}

/// A symbol table entry. `Function` lives in the global rib; `Parameter`
/// and `Variable` live in the rib for the function that declares them.
#[derive(Clone, Debug, PartialEq)]
pub enum SymbolRecord {
    Variable { ty: Type },
    Parameter { ty: Type },
    Function { parameters: Vec<(Symbol, Type)>, return_type: Type },
}

impl SymbolRecord {
    pub fn ty(&self) -> Type {
        match self {
            SymbolRecord::Variable { ty } | SymbolRecord::Parameter { ty } => *ty,
            SymbolRecord::Function { return_type, .. } => *return_type,
        }
    }
}

/// The four value types plus `void`, used only as a return type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Text,
    Bool,
    Void,
}

impl Type {
    pub fn from_keyword(name: &str) -> Option<Type> {
        match name {
            "int" => Some(Type::Int),
            "float" => Some(Type::Float),
            "text" => Some(Type::Text),
            "bool" => Some(Type::Bool),
            "void" => Some(Type::Void),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Text => "text",
            Type::Bool => "bool",
            Type::Void => "void",
        };
        write!(f, "{s}")
    }
}

/// The program's scope tree: one global rib plus one rib per function.
pub struct ScopeTree {
    pub ribs: IndexVec<RibId, Rib>,
    pub global: RibId,
    by_function_name: HashMap<Symbol, RibId>,
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut ribs = IndexVec::new();
        let global = ribs.push(Rib { bindings: HashMap::new(), parent: None, kind: RibKind::Global });
        ScopeTree { ribs, global, by_function_name: HashMap::new() }
    }

    /// Declares `name` as a function in the global rib and opens its body
    /// rib. Returns `None` (after emitting no diagnostic itself — the
    /// caller does that) if `name` was already declared.
    pub fn declare_function(
        &mut self,
        name: Symbol,
        parameters: Vec<(Symbol, Type)>,
        return_type: Type,
    ) -> Option<RibId> {
        if self.ribs[self.global].bindings.contains_key(&name) {
            return None;
        }
        self.ribs[self.global].bindings.insert(
            name,
            SymbolRecord::Function { parameters: parameters.clone(), return_type },
        );

        let rib_id = self.ribs.push(Rib {
            bindings: HashMap::new(),
            parent: Some(self.global),
            kind: RibKind::Function,
        });
        for (param_name, ty) in parameters {
            self.ribs[rib_id].bindings.insert(param_name, SymbolRecord::Parameter { ty });
        }
        self.by_function_name.insert(name, rib_id);
        Some(rib_id)
    }

    /// Declares a local variable in `rib`; `false` if already bound there.
    pub fn declare_variable(&mut self, rib: RibId, name: Symbol, ty: Type) -> bool {
        if self.ribs[rib].bindings.contains_key(&name) {
            return false;
        }
        self.ribs[rib].bindings.insert(name, SymbolRecord::Variable { ty });
        true
    }

    pub fn rib_for_function(&self, name: Symbol) -> Option<RibId> {
        self.by_function_name.get(&name).copied()
    }

    /// Resolves `name` starting in `rib`, walking up to the global rib.
    pub fn resolve(&self, rib: RibId, name: Symbol) -> Option<&SymbolRecord> {
        let mut current = rib;
        loop {
            if let Some(record) = self.ribs[current].bindings.get(&name) {
                return Some(record);
            }
            match self.ribs[current].parent {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mipsc_util::StringTable;

    #[test]
    fn parameters_are_visible_inside_the_function_rib() {
        let mut strings = StringTable::new();
        let f = strings.intern("add");
        let a = strings.intern("a");

        let mut scopes = ScopeTree::new();
        let rib = scopes
            .declare_function(f, vec![(a, Type::Int)], Type::Int)
            .unwrap();

        assert_eq!(scopes.resolve(rib, a), Some(&SymbolRecord::Parameter { ty: Type::Int }));
    }

    #[test]
    fn duplicate_function_declaration_is_rejected() {
        let mut strings = StringTable::new();
        let f = strings.intern("add");

        let mut scopes = ScopeTree::new();
        assert!(scopes.declare_function(f, vec![], Type::Void).is_some());
        assert!(scopes.declare_function(f, vec![], Type::Void).is_none());
    }

    #[test]
    fn duplicate_variable_in_same_function_scope_is_rejected() {
        let mut strings = StringTable::new();
        let f = strings.intern("main");
        let x = strings.intern("x");

        let mut scopes = ScopeTree::new();
        let rib = scopes.declare_function(f, vec![], Type::Int).unwrap();
        assert!(scopes.declare_variable(rib, x, Type::Int));
        assert!(!scopes.declare_variable(rib, x, Type::Float));
    }
}
