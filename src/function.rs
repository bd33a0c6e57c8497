use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::callable::{Arity, Callable};
use crate::environment::Environment;
use crate::error::RuntimeResult;
use crate::interpreter::{ExecResult, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// A user‑defined function or method together with its captured scope.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// A copy of this function whose closure has `this` bound to `receiver`.
    pub fn bind(&self, receiver: Value) -> LoxFunction {
        let mut environment = Environment::with_enclosing(self.closure.clone());
        environment.define("this", receiver);

        LoxFunction {
            declaration: self.declaration.clone(),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    pub fn declaration(&self) -> &FunctionDecl {
        &self.declaration
    }

    /// Bind parameters, packing surplus arguments into the rest parameter.
    ///
    /// With a rest parameter, missing positionals are `nil` and the rest list
    /// is empty. Leading parameters are filled before trailing ones.
    fn bind_arguments(&self, environment: &mut Environment, mut arguments: Vec<Value>) {
        let params = &self.declaration.params;

        let Some(rest) = self.declaration.rest_index() else {
            for (param, argument) in params.iter().zip(arguments) {
                environment.define(&param.name.lexeme, argument);
            }
            return;
        };

        let leading = rest.min(arguments.len());
        let trailing = (params.len() - rest - 1).min(arguments.len() - leading);
        let after = arguments.split_off(arguments.len() - trailing);
        let packed = arguments.split_off(leading);

        let mut before = arguments.into_iter();
        for param in &params[..rest] {
            environment.define(&param.name.lexeme, before.next().unwrap_or(Value::Nil));
        }

        environment.define(&params[rest].name.lexeme, Value::list(packed));

        let mut after = after.into_iter();
        for param in &params[rest + 1..] {
            environment.define(&param.name.lexeme, after.next().unwrap_or(Value::Nil));
        }
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> Arity {
        if self.declaration.rest_index().is_some() {
            Arity::AtLeast(0)
        } else {
            Arity::Fixed(self.declaration.params.len())
        }
    }

    fn name(&self) -> &str {
        self.declaration.display_name()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        _paren: &Token,
        arguments: Vec<Value>,
    ) -> RuntimeResult<Value> {
        debug!("Calling function '{}'", self.name());

        let mut environment = Environment::with_enclosing(self.closure.clone());
        self.bind_arguments(&mut environment, arguments);

        let result = interpreter.execute_block(
            &self.declaration.body,
            Rc::new(RefCell::new(environment)),
        )?;

        if self.is_initializer {
            return Ok(self.closure.borrow().get_at(0, "this").unwrap_or(Value::Nil));
        }

        match result {
            ExecResult::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}
