//! Environment chain for name bindings
//!
//! One scope per function call plus the global scope, each linked to its
//! lexical parent. The same chain stores types while type checking and
//! values while evaluating.

use crate::error::EnvError;
use crate::interp::Value;
use crate::types::Type;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared reference to an environment
pub type EnvRef<V> = Rc<RefCell<Environment<V>>>;

/// Scope chain used during type checking
pub type TypeEnvironment = Environment<Type>;
/// Scope chain used during evaluation
pub type ValueEnvironment = Environment<Value>;

pub type TypeEnvRef = EnvRef<Type>;
pub type ValueEnvRef = EnvRef<Value>;

/// Environment holding name bindings
#[derive(Debug)]
pub struct Environment<V> {
    /// Bindings in this scope
    bindings: HashMap<String, V>,
    /// Parent environment for lexical scoping
    parent: Option<EnvRef<V>>,
}

impl<V: Clone> Environment<V> {
    /// Create a new global environment
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    /// Create a new environment with a parent
    pub fn with_parent(parent: EnvRef<V>) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> EnvRef<V> {
        Rc::new(RefCell::new(self))
    }

    /// Declare a name in the current scope.
    ///
    /// Shadowing a name from an outer scope is allowed; declaring it twice
    /// in the same scope is not.
    pub fn create(&mut self, name: impl Into<String>, value: V) -> Result<(), EnvError> {
        let name = name.into();
        if self.bindings.contains_key(&name) {
            return Err(EnvError::Redeclaration(name));
        }
        self.bindings.insert(name, value);
        Ok(())
    }

    /// Look up a name in the scope chain
    pub fn resolve(&self, name: &str) -> Result<V, EnvError> {
        if let Some(value) = self.bindings.get(name) {
            Ok(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().resolve(name)
        } else {
            Err(EnvError::Unbound(name.to_string()))
        }
    }

    /// Overwrite the innermost binding of `name`.
    ///
    /// A name bound nowhere in the chain is defined in the global scope.
    pub fn update(&mut self, name: &str, value: V) {
        if self.bindings.contains_key(name) || self.parent.is_none() {
            self.bindings.insert(name.to_string(), value);
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().update(name, value);
        }
    }

    /// Check if a name exists in the scope chain
    pub fn contains(&self, name: &str) -> bool {
        if self.bindings.contains_key(name) {
            true
        } else if let Some(parent) = &self.parent {
            parent.borrow().contains(name)
        } else {
            false
        }
    }

    /// Check if a name is bound in this scope, ignoring parents
    pub fn contains_local(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Number of scopes from here to the global scope, inclusive
    pub fn depth(&self) -> usize {
        match &self.parent {
            Some(parent) => 1 + parent.borrow().depth(),
            None => 1,
        }
    }
}

impl<V: Clone> Default for Environment<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a child environment from a parent reference
pub fn child_env<V: Clone>(parent: &EnvRef<V>) -> EnvRef<V> {
    Environment::with_parent(Rc::clone(parent)).into_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let mut env = ValueEnvironment::new();
        env.create("x", Value::Int(42)).unwrap();
        assert_eq!(env.resolve("x"), Ok(Value::Int(42)));
        assert_eq!(env.resolve("y"), Err(EnvError::Unbound("y".to_string())));
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let mut env = TypeEnvironment::new();
        env.create("x", Type::Int).unwrap();
        assert_eq!(
            env.create("x", Type::Bool),
            Err(EnvError::Redeclaration("x".to_string()))
        );
        assert_eq!(env.resolve("x"), Ok(Type::Int));
    }

    #[test]
    fn test_shadowing_in_nested_scope() {
        let parent = TypeEnvironment::new().into_ref();
        parent.borrow_mut().create("x", Type::Int).unwrap();

        let child = child_env(&parent);
        child.borrow_mut().create("x", Type::String).unwrap();

        assert_eq!(child.borrow().resolve("x"), Ok(Type::String));
        assert_eq!(parent.borrow().resolve("x"), Ok(Type::Int));
    }

    #[test]
    fn test_scope_chain() {
        let parent = ValueEnvironment::new().into_ref();
        parent.borrow_mut().create("x", Value::Int(1)).unwrap();

        let child = child_env(&parent);
        child.borrow_mut().create("y", Value::Int(2)).unwrap();

        assert_eq!(child.borrow().resolve("x"), Ok(Value::Int(1)));
        assert_eq!(child.borrow().resolve("y"), Ok(Value::Int(2)));
        assert!(parent.borrow().resolve("y").is_err());
    }

    #[test]
    fn test_update_existing_in_current_scope() {
        let mut env = ValueEnvironment::new();
        env.create("x", Value::Int(1)).unwrap();
        env.update("x", Value::Int(42));
        assert_eq!(env.resolve("x"), Ok(Value::Int(42)));
    }

    #[test]
    fn test_update_delegates_to_parent() {
        let parent = ValueEnvironment::new().into_ref();
        parent.borrow_mut().create("x", Value::Int(1)).unwrap();

        let child = child_env(&parent);
        child.borrow_mut().update("x", Value::Int(99));

        assert_eq!(parent.borrow().resolve("x"), Ok(Value::Int(99)));
        assert!(!child.borrow().contains_local("x"));
    }

    #[test]
    fn test_update_unbound_defines_globally() {
        let global = ValueEnvironment::new().into_ref();
        let middle = child_env(&global);
        let inner = child_env(&middle);

        inner.borrow_mut().update("fresh", Value::Bool(true));

        assert!(global.borrow().contains_local("fresh"));
        assert!(!middle.borrow().contains_local("fresh"));
        assert!(!inner.borrow().contains_local("fresh"));
        assert_eq!(inner.borrow().resolve("fresh"), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_update_prefers_innermost_binding() {
        let global = TypeEnvironment::new().into_ref();
        global.borrow_mut().create("x", Type::Int).unwrap();
        let inner = child_env(&global);
        inner.borrow_mut().create("x", Type::Bool).unwrap();

        inner.borrow_mut().update("x", Type::String);

        assert_eq!(inner.borrow().resolve("x"), Ok(Type::String));
        assert_eq!(global.borrow().resolve("x"), Ok(Type::Int));
    }

    #[test]
    fn test_contains_and_depth() {
        let global = TypeEnvironment::new().into_ref();
        global.borrow_mut().create("x", Type::Unit).unwrap();
        let child = child_env(&global);
        let grandchild = child_env(&child);

        assert!(grandchild.borrow().contains("x"));
        assert!(!grandchild.borrow().contains("y"));
        assert_eq!(global.borrow().depth(), 1);
        assert_eq!(grandchild.borrow().depth(), 3);
    }
}
