//! The lexical scope chain: a singly-linked chain of binding tables, each
//! with a parent pointer back to the scope it was opened inside.
//!
//! Blocks, loop bodies, and function calls each push a child scope;
//! `lookup`/`assign` walk up the parent chain, so a name resolves to the
//! nearest enclosing binding. The global scope sits at the root with no
//! parent.

use crate::error::{Result, RuntimeError};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A single variable binding: its current value and whether it was
/// introduced with `let` (immutable) or `var` (mutable).
struct Binding {
    value: Value,
    is_const: bool,
}

struct ScopeData {
    bindings: HashMap<String, Binding>,
    parent: Option<ScopeRef>,
}

/// A shared, mutable handle onto one scope in the chain.
#[derive(Clone)]
pub struct ScopeRef(Rc<RefCell<ScopeData>>);

impl ScopeRef {
    /// Creates a new scope with no parent, for the top level of a program.
    pub fn new_global() -> Self {
        ScopeRef(Rc::new(RefCell::new(ScopeData {
            bindings: HashMap::new(),
            parent: None,
        })))
    }

    /// Opens a new, empty scope whose parent is `self`.
    pub fn child(&self) -> Self {
        ScopeRef(Rc::new(RefCell::new(ScopeData {
            bindings: HashMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// Introduces a new binding in this scope, shadowing any binding of the
    /// same name in an enclosing scope. Redeclaring a name already present
    /// in *this* scope silently replaces it (Wisp has no separate
    /// redeclaration error; `let`/`var` in the same block simply rebind).
    pub fn define(&self, name: impl Into<String>, value: Value, is_const: bool) {
        self.0.borrow_mut().bindings.insert(name.into(), Binding { value, is_const });
    }

    /// Looks up a name by walking up the parent chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let data = self.0.borrow();
        if let Some(binding) = data.bindings.get(name) {
            Some(binding.value.clone())
        } else if let Some(parent) = &data.parent {
            parent.lookup(name)
        } else {
            None
        }
    }

    /// Reassigns an existing binding, walking up the parent chain to find
    /// it. Fails if the name is undefined or bound with `let`.
    pub fn assign(&self, name: &str, value: Value, line: u32, column: u32) -> Result<()> {
        let mut data = self.0.borrow_mut();
        if let Some(binding) = data.bindings.get_mut(name) {
            if binding.is_const {
                return Err(RuntimeError::assign_to_constant(name, line, column).into());
            }
            binding.value = value;
            return Ok(());
        }
        let parent = data.parent.clone();
        drop(data);
        match parent {
            Some(parent) => parent.assign(name, value, line, column),
            None => Err(RuntimeError::undefined_variable(name, line, column).into()),
        }
    }

    /// True if `name` is bound (anywhere in the chain) with `let`.
    pub fn is_const(&self, name: &str) -> Option<bool> {
        let data = self.0.borrow();
        if let Some(binding) = data.bindings.get(name) {
            Some(binding.is_const)
        } else if let Some(parent) = &data.parent {
            parent.is_const(name)
        } else {
            None
        }
    }

    /// True if `name` is bound directly in this scope, not an ancestor.
    pub fn has_own(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// The enclosing scope, if any.
    pub fn parent(&self) -> Option<ScopeRef> {
        self.0.borrow().parent.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_scope_sees_parent_bindings() {
        let global = ScopeRef::new_global();
        global.define("x", Value::Int(1), false);
        let child = global.child();
        assert!(matches!(child.lookup("x"), Some(Value::Int(1))));
    }

    #[test]
    fn assign_in_child_mutates_parent_binding() {
        let global = ScopeRef::new_global();
        global.define("x", Value::Int(1), false);
        let child = global.child();
        child.assign("x", Value::Int(2), 1, 1).unwrap();
        assert!(matches!(global.lookup("x"), Some(Value::Int(2))));
    }

    #[test]
    fn assign_to_let_binding_errors() {
        let global = ScopeRef::new_global();
        global.define("x", Value::Int(1), true);
        let err = global.assign("x", Value::Int(2), 1, 1).unwrap_err();
        assert!(err.detail().contains("constant"));
    }

    #[test]
    fn assign_to_undefined_errors() {
        let global = ScopeRef::new_global();
        let err = global.assign("missing", Value::Int(2), 1, 1).unwrap_err();
        assert!(err.detail().contains("Undefined"));
    }

    #[test]
    fn shadowing_in_child_does_not_affect_parent() {
        let global = ScopeRef::new_global();
        global.define("x", Value::Int(1), false);
        let child = global.child();
        child.define("x", Value::Int(99), false);
        assert!(matches!(child.lookup("x"), Some(Value::Int(99))));
        assert!(matches!(global.lookup("x"), Some(Value::Int(1))));
    }
}
