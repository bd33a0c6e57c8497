//! Classes and instances.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{Arity, Callable};
use crate::error::{RuntimeError, RuntimeResult};
use crate::function::LoxFunction;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

pub struct LoxClass {
    pub name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
    static_methods: HashMap<String, Rc<LoxFunction>>,
    static_fields: RefCell<HashMap<String, Value>>,
}

impl LoxClass {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
        static_methods: HashMap<String, Rc<LoxFunction>>,
        static_fields: HashMap<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            superclass,
            methods,
            static_methods,
            static_fields: RefCell::new(static_fields),
        }
    }

    pub fn superclass(&self) -> Option<&Rc<LoxClass>> {
        self.superclass.as_ref()
    }

    /// Visit this class and its ancestors, nearest first, until `visit`
    /// returns `Some`.  A class seen twice means the chain is cyclic.
    fn search_chain<T>(
        &self,
        mut visit: impl FnMut(&LoxClass) -> Option<T>,
    ) -> Result<Option<T>, InheritanceCycle> {
        let mut visited: HashSet<*const LoxClass> = HashSet::new();
        let mut current: Option<&LoxClass> = Some(self);

        while let Some(class) = current {
            if !visited.insert(class as *const LoxClass) {
                return Err(InheritanceCycle);
            }

            if let Some(found) = visit(class) {
                return Ok(Some(found));
            }

            current = class.superclass.as_deref();
        }

        Ok(None)
    }

    /// [`search_chain`](Self::search_chain) with a cycle reported at `site`.
    fn walk_chain<T>(
        &self,
        site: &Token,
        visit: impl FnMut(&LoxClass) -> Option<T>,
    ) -> RuntimeResult<Option<T>> {
        self.search_chain(visit).map_err(|InheritanceCycle| {
            RuntimeError::new(
                site,
                format!("Inheritance cycle detected in class '{}'.", self.name),
            )
        })
    }

    /// Instance method `name`, searched through the superclass chain.
    pub fn find_method(&self, name: &Token) -> RuntimeResult<Option<Rc<LoxFunction>>> {
        self.walk_chain(name, |class| class.methods.get(&name.lexeme).cloned())
    }

    pub fn find_static_method(&self, name: &Token) -> RuntimeResult<Option<Rc<LoxFunction>>> {
        self.walk_chain(name, |class| class.static_methods.get(&name.lexeme).cloned())
    }

    /// Static field or static method, searched through the superclass chain.
    /// Static methods are bound with `this` set to `receiver`.
    pub fn get_static(self: &Rc<Self>, name: &Token) -> RuntimeResult<Value> {
        let receiver = Value::Class(self.clone());

        let found = self.walk_chain(name, |class| {
            if let Some(value) = class.static_fields.borrow().get(&name.lexeme) {
                return Some(value.clone());
            }

            class
                .static_methods
                .get(&name.lexeme)
                .map(|method| Value::Function(Rc::new(method.bind(receiver.clone()))))
        })?;

        found.ok_or_else(|| undefined_property(name))
    }

    pub fn set_static(&self, name: &Token, value: Value) {
        self.static_fields
            .borrow_mut()
            .insert(name.lexeme.clone(), value);
    }

    fn initializer(&self, site: &Token) -> RuntimeResult<Option<Rc<LoxFunction>>> {
        self.walk_chain(site, |class| class.methods.get("init").cloned())
    }
}

/// A superclass chain that visits the same class twice.
struct InheritanceCycle;

impl Callable for Rc<LoxClass> {
    fn arity(&self) -> Arity {
        match self.search_chain(|class| class.methods.get("init").cloned()) {
            Ok(Some(init)) => init.arity(),
            Ok(None) => Arity::Fixed(0),
            // let the call through so `call` reports the cycle at the call site
            Err(InheritanceCycle) => Arity::AtLeast(0),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// Instantiate, run `init` if the chain has one, and yield the instance.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> RuntimeResult<Value> {
        debug!("Instantiating class '{}'", self.name);

        let instance = Value::Instance(Rc::new(LoxInstance::new(self.clone())));

        if let Some(init) = self.initializer(paren)? {
            init.bind(instance.clone()).call(interpreter, paren, arguments)?;
        }

        Ok(instance)
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: RefCell<HashMap<String, Value>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Field first, then a method bound to this instance.
    pub fn get(self: &Rc<Self>, name: &Token) -> RuntimeResult<Value> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        match self.class.find_method(name)? {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Instance(self.clone())),
            ))),
            None => Err(undefined_property(name)),
        }
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}

pub fn undefined_property(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined property '{}'.", name.lexeme))
}
