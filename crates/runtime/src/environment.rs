//! Lexically-scoped activation records for the tree-walking interpreter.
//! Closures capture their defining scope, not a fresh dynamic one.
//!
//! Each [`Environment`] is a shared, mutable frame linked to its parent;
//! `fun` bodies close over the environment active at definition time rather
//! than the caller's environment, so nested functions behave as closures.

use loks_util::symbol::Symbol;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

use crate::value::Value;

struct Scope {
    values: FxHashMap<Symbol, Value>,
    parent: Option<Environment>,
}

/// A reference-counted, shared scope. Cloning an `Environment` shares the
/// same underlying bindings (needed so a closure and its defining scope see
/// each other's later mutations).
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    pub fn new_root() -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            values: FxHashMap::default(),
            parent: None,
        })))
    }

    pub fn child_of(parent: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            values: FxHashMap::default(),
            parent: Some(parent.clone()),
        })))
    }

    /// Introduces a new binding in this scope (`var` declarations and
    /// parameter binding at call time). Shadows an outer binding of the
    /// same name without disturbing it.
    pub fn define(&self, name: Symbol, value: Value) {
        self.0.borrow_mut().values.insert(name, value);
    }

    /// Looks up `name`, walking outward through enclosing scopes.
    pub fn get(&self, name: Symbol) -> Option<Value> {
        let scope = self.0.borrow();
        if let Some(value) = scope.values.get(&name) {
            return Some(value.clone());
        }
        scope.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Assigns to an existing binding of `name`, walking outward. Returns
    /// `false` if no such binding exists anywhere in the chain (a `NameError`
    /// at the call site).
    pub fn assign(&self, name: Symbol, value: Value) -> bool {
        let mut scope = self.0.borrow_mut();
        if scope.values.contains_key(&name) {
            scope.values.insert(name, value);
            return true;
        }
        match &scope.parent {
            Some(parent) => {
                let parent = parent.clone();
                drop(scope);
                parent.assign(name, value)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        loks_util::symbol::intern(name)
    }

    #[test]
    fn child_scope_sees_parent_bindings() {
        let root = Environment::new_root();
        root.define(sym("x"), Value::Nil);
        let child = Environment::child_of(&root);
        assert!(child.get(sym("x")).is_some());
    }

    #[test]
    fn assignment_in_child_updates_parent_binding() {
        let root = Environment::new_root();
        root.define(sym("x"), Value::Boolean(false));
        let child = Environment::child_of(&root);
        assert!(child.assign(sym("x"), Value::Boolean(true)));
        match root.get(sym("x")) {
            Some(Value::Boolean(true)) => {}
            other => panic!("expected Boolean(true), got {other:?}"),
        }
    }

    #[test]
    fn assigning_an_undeclared_name_fails() {
        let root = Environment::new_root();
        assert!(!root.assign(sym("missing"), Value::Nil));
    }

    #[test]
    fn shadowing_does_not_disturb_the_outer_binding() {
        let root = Environment::new_root();
        root.define(sym("x"), Value::Number(crate::value::Number::Integer(1)));
        let child = Environment::child_of(&root);
        child.define(sym("x"), Value::Number(crate::value::Number::Integer(2)));
        match (child.get(sym("x")), root.get(sym("x"))) {
            (Some(Value::Number(crate::value::Number::Integer(2))), Some(Value::Number(crate::value::Number::Integer(1)))) => {}
            other => panic!("unexpected scoping result: {other:?}"),
        }
    }
}
