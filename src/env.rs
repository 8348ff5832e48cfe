// ABOUTME: Environment module for managing variable bindings and scopes

use crate::error::HexError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// A single scope: bindings, the names flagged constant, and a parent link.
///
/// Environments form a tree rooted at the global scope. Lookups walk the
/// parent chain; `define` always writes to this scope; `assign` and `delete`
/// modify the owning scope. Errors come back without a source position and
/// the evaluator stamps the call site on.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    constants: RefCell<HashSet<String>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates the root environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            constants: RefCell::new(HashSet::new()),
            parent: None,
        })
    }

    /// Creates a child environment chained to a parent.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            constants: RefCell::new(HashSet::new()),
            parent: Some(parent),
        })
    }

    /// Defines a binding in THIS scope, shadowing any outer binding of the
    /// same name. Never touches the parent chain.
    pub fn define(&self, name: impl Into<String>, value: Value, is_const: bool) {
        let name = name.into();
        if is_const {
            self.constants.borrow_mut().insert(name.clone());
        }
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Looks a name up through the scope chain.
    pub fn get(&self, name: &str) -> Result<Value, HexError> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(name),
            None => Err(HexError::unknown(format!("Undefined variable '{}'", name))),
        }
    }

    /// Rebinds the nearest existing binding of `name`.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), HexError> {
        if self.constants.borrow().contains(name) {
            return Err(HexError::prophecy(format!(
                "Cannot modify the prophecy '{}' - it is constant",
                name
            )));
        }

        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }

        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(HexError::unknown(format!("Undefined variable '{}'", name))),
        }
    }

    /// Removes the nearest binding of `name` from the scope that owns it.
    pub fn delete(&self, name: &str) -> Result<(), HexError> {
        if self.constants.borrow().contains(name) {
            return Err(HexError::prophecy(format!(
                "Cannot vanquish the prophecy '{}' - it is constant",
                name
            )));
        }

        if self.bindings.borrow_mut().remove(name).is_some() {
            return Ok(());
        }

        match &self.parent {
            Some(parent) => parent.delete(name),
            None => Err(HexError::unknown(format!("Undefined variable '{}'", name))),
        }
    }

    /// True if `name` is flagged constant anywhere along the chain.
    pub fn is_constant(&self, name: &str) -> bool {
        if self.constants.borrow().contains(name) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.is_constant(name),
            None => false,
        }
    }

    /// True if `name` is bound anywhere along the chain.
    pub fn exists(&self, name: &str) -> bool {
        if self.bindings.borrow().contains_key(name) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.exists(name),
            None => false,
        }
    }

    /// True if `name` is bound in this scope alone.
    pub fn exists_local(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        env.define("x", Value::Int(42), false);

        match env.get("x") {
            Ok(Value::Int(n)) => assert_eq!(n, 42),
            other => panic!("Expected Int(42), got {:?}", other),
        }
    }

    #[test]
    fn test_undefined_name() {
        let env = Environment::new();
        let err = env.get("ghost").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownIncantation);
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new();
        parent.define("x", Value::Int(42), false);

        let child = Environment::with_parent(parent.clone());
        child.define("x", Value::Int(100), false);

        assert!(matches!(child.get("x"), Ok(Value::Int(100))));
        assert!(matches!(parent.get("x"), Ok(Value::Int(42))));
    }

    #[test]
    fn test_parent_lookup() {
        let parent = Environment::new();
        parent.define("x", Value::Int(42), false);

        let child = Environment::with_parent(parent);
        assert!(matches!(child.get("x"), Ok(Value::Int(42))));
    }

    #[test]
    fn test_assign_rebinds_owning_scope() {
        let parent = Environment::new();
        parent.define("x", Value::Int(1), false);

        let child = Environment::with_parent(parent.clone());
        child.assign("x", Value::Int(2)).unwrap();

        assert!(matches!(parent.get("x"), Ok(Value::Int(2))));
        assert!(!child.exists_local("x"));
    }

    #[test]
    fn test_assign_undefined_fails() {
        let env = Environment::new();
        let err = env.assign("ghost", Value::Void).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownIncantation);
    }

    #[test]
    fn test_constant_protection() {
        let env = Environment::new();
        env.define("PI", Value::Float(3.14), true);

        let err = env.assign("PI", Value::Int(4)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ProphecyViolation);

        let err = env.delete("PI").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ProphecyViolation);

        // Untouched
        assert!(matches!(env.get("PI"), Ok(Value::Float(_))));
    }

    #[test]
    fn test_constant_protected_through_child_scope() {
        let parent = Environment::new();
        parent.define("LIMIT", Value::Int(10), true);

        let child = Environment::with_parent(parent);
        let err = child.assign("LIMIT", Value::Int(11)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ProphecyViolation);

        let err = child.delete("LIMIT").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ProphecyViolation);
    }

    #[test]
    fn test_delete_removes_binding() {
        let env = Environment::new();
        env.define("x", Value::Int(1), false);
        env.delete("x").unwrap();
        assert!(!env.exists("x"));
        assert!(env.delete("x").is_err());
    }

    #[test]
    fn test_delete_walks_chain() {
        let parent = Environment::new();
        parent.define("x", Value::Int(1), false);

        let child = Environment::with_parent(parent.clone());
        child.delete("x").unwrap();
        assert!(!parent.exists("x"));
    }

    #[test]
    fn test_exists_and_exists_local() {
        let parent = Environment::new();
        parent.define("a", Value::Int(1), false);

        let child = Environment::with_parent(parent);
        child.define("b", Value::Int(2), false);

        assert!(child.exists("a"));
        assert!(child.exists("b"));
        assert!(!child.exists_local("a"));
        assert!(child.exists_local("b"));
    }

    #[test]
    fn test_is_constant_walks_chain() {
        let parent = Environment::new();
        parent.define("K", Value::Int(1), true);

        let child = Environment::with_parent(parent);
        assert!(child.is_constant("K"));
        assert!(!child.is_constant("x"));
    }
}
