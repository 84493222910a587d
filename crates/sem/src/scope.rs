//! The analyzer's chain of symbol tables.
//!
//! A [`SymbolTable`] is a named scope with a mapping from identifier to
//! [`SymbolKind`], plus an optional link to an enclosing scope. Lookup walks
//! outward through that chain; `declare` only ever inserts into the
//! *current* scope, which is what lets the analyzer tell a shadowing `var`
//! in a nested block apart from a duplicate declaration in the same block.

use crate::types::SymbolKind;
use loks_util::symbol::Symbol;
use rustc_hash::FxHashMap;

/// A single lexical scope in the analyzer's scope chain.
#[derive(Default)]
pub struct SymbolTable {
    bindings: FxHashMap<Symbol, SymbolKind>,
    parent: Option<Box<SymbolTable>>,
}

impl SymbolTable {
    /// An empty root scope with no enclosing scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a new child scope, moving `self` behind it as its parent.
    pub fn push(self) -> Self {
        Self {
            bindings: FxHashMap::default(),
            parent: Some(Box::new(self)),
        }
    }

    /// Pops back to the enclosing scope, discarding bindings made in the
    /// current one. Panics if called on the root scope — callers only ever
    /// pop a scope they themselves pushed.
    pub fn pop(self) -> Self {
        *self.parent.expect("pop() called on the root scope")
    }

    /// Declares `name` in the *current* scope, returning `false` (and
    /// leaving the existing binding untouched) if `name` is already
    /// declared here — the analyzer reports that as a duplicate-declaration
    /// `NameError` without disturbing the original binding.
    pub fn declare(&mut self, name: Symbol, kind: SymbolKind) -> bool {
        if self.bindings.contains_key(&name) {
            return false;
        }
        self.bindings.insert(name, kind);
        true
    }

    /// `true` if `name` is declared in the *current* scope only (used for
    /// the duplicate-declaration check, which must not see outer scopes).
    pub fn declared_in_current_scope(&self, name: Symbol) -> bool {
        self.bindings.contains_key(&name)
    }

    /// Resolves `name`, walking outward through enclosing scopes.
    pub fn resolve(&self, name: Symbol) -> Option<&SymbolKind> {
        if let Some(kind) = self.bindings.get(&name) {
            return Some(kind);
        }
        self.parent.as_ref().and_then(|p| p.resolve(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_walks_outward_through_parent_scopes() {
        let mut root = SymbolTable::new();
        let x = loks_util::symbol::intern("x");
        root.declare(x, SymbolKind::Variable);

        let child = root.push();
        assert_eq!(child.resolve(x), Some(&SymbolKind::Variable));
    }

    #[test]
    fn declare_fails_on_duplicate_in_same_scope() {
        let mut table = SymbolTable::new();
        let x = loks_util::symbol::intern("dup_case");
        assert!(table.declare(x, SymbolKind::Variable));
        assert!(!table.declare(x, SymbolKind::Variable));
    }

    #[test]
    fn shadowing_in_a_child_scope_is_not_a_duplicate() {
        let mut root = SymbolTable::new();
        let x = loks_util::symbol::intern("shadow_case");
        root.declare(x, SymbolKind::Variable);

        let mut child = root.push();
        assert!(child.declare(x, SymbolKind::Variable));
    }

    #[test]
    fn pop_discards_the_child_scopes_bindings() {
        let root = SymbolTable::new();
        let mut child = root.push();
        let x = loks_util::symbol::intern("popped_case");
        child.declare(x, SymbolKind::Variable);
        let root = child.pop();
        assert_eq!(root.resolve(x), None);
    }
}
