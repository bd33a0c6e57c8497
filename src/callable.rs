//! The call contract shared by user functions, classes and natives.

use std::fmt;

use crate::error::RuntimeResult;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Number of arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// Variadic with a minimum; `AtLeast(0)` accepts anything.
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Fixed(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Anything that can appear before `(...)`.
///
/// The evaluator checks [`arity`](Callable::arity) before calling, so
/// implementations may assume the argument count is acceptable.
pub trait Callable {
    fn arity(&self) -> Arity;

    fn name(&self) -> &str;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> RuntimeResult<Value>;
}

pub type NativeFn = dyn Fn(&mut Interpreter, &Token, Vec<Value>) -> RuntimeResult<Value>;

/// A callable implemented in Rust.
pub struct NativeFunction {
    name: String,
    arity: Arity,
    func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, arity: Arity, func: F) -> Self
    where
        F: Fn(&mut Interpreter, &Token, Vec<Value>) -> RuntimeResult<Value> + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Box::new(func),
        }
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> Arity {
        self.arity
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> RuntimeResult<Value> {
        (self.func)(interpreter, paren, arguments)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}
