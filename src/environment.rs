use crate::error::{RuntimeError, RuntimeResult};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope at runtime.  Scopes form a parent‑linked chain shared
/// through `Rc<RefCell<_>>`, so a closure keeps its defining scope alive.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Convenience: a fresh shared child of `enclosing`.
    pub fn child_of(enclosing: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::with_enclosing(enclosing.clone())))
    }

    /// Bind `name` in this scope, replacing any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> RuntimeResult<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Assign to the nearest scope that already declares `name`.
    pub fn assign(&mut self, name: &Token, value: Value) -> RuntimeResult<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Read `name` exactly `distance` scopes up the chain.
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Value> {
        if distance == 0 {
            return self.values.get(name).cloned();
        }

        self.enclosing
            .as_ref()
            .and_then(|enclosing| enclosing.borrow().get_at(distance - 1, name))
    }

    /// Write `name` exactly `distance` scopes up the chain.  Returns `false`
    /// if that scope does not exist.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) -> bool {
        if distance == 0 {
            self.values.insert(name.to_string(), value);
            return true;
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign_at(distance - 1, name, value),
            None => false,
        }
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_nil_is_not_undefined() {
        let mut env = Environment::new();
        env.define("x", Value::Nil);

        assert_eq!(env.get(&Token::synthetic("x", 1)).unwrap(), Value::Nil);
        assert!(env.get(&Token::synthetic("y", 1)).is_err());
    }

    #[test]
    fn assign_walks_to_the_declaring_scope() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("x", Value::Int(1));

        let inner = Environment::child_of(&outer);
        inner
            .borrow_mut()
            .assign(&Token::synthetic("x", 1), Value::Int(2))
            .unwrap();

        assert_eq!(outer.borrow().get_at(0, "x"), Some(Value::Int(2)));
        assert_eq!(inner.borrow().get_at(1, "x"), Some(Value::Int(2)));
        assert_eq!(inner.borrow().get_at(0, "x"), None);
    }

    #[test]
    fn assign_never_creates_globals() {
        let mut env = Environment::new();
        let err = env
            .assign(&Token::synthetic("ghost", 3), Value::Int(1))
            .unwrap_err();

        assert_eq!(err.to_string(), "Undefined variable 'ghost'.\n[line 3]");
    }
}
