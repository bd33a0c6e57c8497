//! Runtime values.
//!
//! Scalars are stored inline; everything with identity or sharing semantics
//! sits behind an `Rc`.  Native object kinds (lists, dicts, enums, anything a
//! stdlib module adds) live behind the single [`Value::Object`] variant and
//! participate in the language through the [`LoxObject`] capability trait.

use std::fmt;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::callable::{Callable, NativeFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::function::LoxFunction;
use crate::numeric;
use crate::object::list::ListObject;
use crate::object::LoxObject;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    BigInt(Rc<BigInt>),
    BigFloat(Rc<BigDecimal>),
    Str(Rc<str>),
    Function(Rc<LoxFunction>),
    Native(Rc<NativeFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<LoxInstance>),
    Object(Rc<dyn LoxObject>),
}

impl Value {
    /// `nil` and `false` are falsy; every other value is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Float(_) | Value::BigInt(_) | Value::BigFloat(_)
        )
    }

    /// Name reported by `type()` and in runtime error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::BigInt(_) => "bigint",
            Value::BigFloat(_) => "bigfloat",
            Value::Str(_) => "string",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Object(object) => object.type_name(),
        }
    }

    /// Language equality: numeric across the tower, otherwise same‑kind.
    /// Never fails.
    pub fn equals(&self, other: &Value) -> bool {
        if let Some(equal) = numeric::equals(self, other) {
            return equal;
        }

        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)) || a.equals(b.as_ref())
            }
            _ => false,
        }
    }

    /// Elements produced by `foreach` and spread: string characters or the
    /// object's iterate capability.
    pub fn iterate(&self) -> Option<Vec<Value>> {
        match self {
            Value::Str(s) => Some(s.chars().map(|c| Value::from(c.to_string())).collect()),
            Value::Object(object) => object.iterate(),
            _ => None,
        }
    }

    /// Length capability; strings count characters.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Object(object) => object.length(),
            _ => None,
        }
    }

    /// Display form used inside container literals: strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{}\"", s),
            other => other.to_string(),
        }
    }

    /// Wrap elements in a fresh list object.
    pub fn list(items: Vec<Value>) -> Value {
        Value::Object(Rc::new(ListObject::new(items)))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Int(n) => {
                let mut buf = itoa::Buffer::new();
                f.write_str(buf.format(*n))
            }

            // 4.0 prints as "4.0", 0.1 as "0.1"
            Value::Float(n) => write!(f, "{:?}", n),

            Value::BigInt(n) => write!(f, "{}", n),

            Value::BigFloat(n) => write!(f, "{}", n),

            Value::Str(s) => f.write_str(s),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Native(native) => write!(f, "<native fn {}>", native.name()),

            Value::Class(class) => f.write_str(&class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.class().name),

            Value::Object(object) => f.write_str(&object.stringify()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str({:?})", s),
            other => write!(f, "{}({})", other.type_name(), other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::BigInt(Rc::new(n))
    }
}

impl From<BigDecimal> for Value {
    fn from(n: BigDecimal) -> Self {
        Value::BigFloat(Rc::new(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}
