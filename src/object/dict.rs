use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::callable::{Arity, NativeFunction};
use crate::error::RuntimeError;
use crate::object::{equals_once, stringify_once, LoxObject, ObjectResult};
use crate::value::Value;

/// Hashable projection of a [`Value`].  Integral `BigInt`s that fit in 64
/// bits hash as `Int`, so `1` and `bigint(1)` address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    Nil,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Str(Rc<str>),
}

impl DictKey {
    pub fn from_value(value: &Value) -> ObjectResult<Self> {
        match value {
            Value::Nil => Ok(DictKey::Nil),
            Value::Bool(b) => Ok(DictKey::Bool(*b)),
            Value::Int(n) => Ok(DictKey::Int(*n)),
            Value::BigInt(n) => Ok(match n.to_i64() {
                Some(small) => DictKey::Int(small),
                None => DictKey::BigInt(n.as_ref().clone()),
            }),
            Value::Str(s) => Ok(DictKey::Str(s.clone())),
            other => Err(format!("Unhashable key type: {}.", other.type_name())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DictKey::Nil => Value::Nil,
            DictKey::Bool(b) => Value::Bool(*b),
            DictKey::Int(n) => Value::Int(*n),
            DictKey::BigInt(n) => Value::from(n.clone()),
            DictKey::Str(s) => Value::Str(s.clone()),
        }
    }
}

/// Insertion‑ordered mutable map.
#[derive(Debug, Default)]
pub struct DictObject {
    entries: RefCell<IndexMap<DictKey, Value>>,
}

impl DictObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &Value, value: Value) -> ObjectResult<()> {
        let key = DictKey::from_value(key)?;
        self.entries.borrow_mut().insert(key, value);

        Ok(())
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.borrow().keys().map(DictKey::to_value).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.borrow().values().cloned().collect()
    }
}

impl LoxObject for DictObject {
    fn type_name(&self) -> &'static str {
        "dict"
    }

    fn stringify(&self) -> String {
        stringify_once(self, "{...}", || {
            let entries: Vec<String> = self
                .entries
                .borrow()
                .iter()
                .map(|(k, v)| format!("{}: {}", k.to_value().repr(), v.repr()))
                .collect();

            format!("{{{}}}", entries.join(", "))
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get(self: Rc<Self>, name: &str) -> Option<Value> {
        let dict = self.clone();

        let native = match name {
            "len" => NativeFunction::new("len", Arity::Fixed(0), move |_, _, _| {
                Ok(Value::Int(dict.entries.borrow().len() as i64))
            }),

            "keys" => NativeFunction::new("keys", Arity::Fixed(0), move |_, _, _| {
                Ok(Value::list(dict.keys()))
            }),

            "values" => NativeFunction::new("values", Arity::Fixed(0), move |_, _, _| {
                Ok(Value::list(dict.values()))
            }),

            "has" => NativeFunction::new("has", Arity::Fixed(1), move |_, paren, args| {
                let key = DictKey::from_value(&args[0])
                    .map_err(|msg| RuntimeError::new(paren, msg))?;

                Ok(Value::Bool(dict.entries.borrow().contains_key(&key)))
            }),

            "remove" => NativeFunction::new("remove", Arity::Fixed(1), move |_, paren, args| {
                let key = DictKey::from_value(&args[0])
                    .map_err(|msg| RuntimeError::new(paren, msg))?;

                Ok(dict
                    .entries
                    .borrow_mut()
                    .shift_remove(&key)
                    .unwrap_or(Value::Nil))
            }),

            _ => return None,
        };

        Some(Value::Native(Rc::new(native)))
    }

    /// Keys, in insertion order.
    fn iterate(&self) -> Option<Vec<Value>> {
        Some(self.keys())
    }

    fn length(&self) -> Option<usize> {
        Some(self.entries.borrow().len())
    }

    /// Missing keys read as `nil`.
    fn index(&self, index: &Value) -> ObjectResult<Value> {
        let key = DictKey::from_value(index)?;

        Ok(self
            .entries
            .borrow()
            .get(&key)
            .cloned()
            .unwrap_or(Value::Nil))
    }

    fn set_index(&self, index: &Value, value: Value) -> ObjectResult<()> {
        self.insert(index, value)
    }

    fn equals(&self, other: &dyn LoxObject) -> bool {
        let Some(other) = other.as_any().downcast_ref::<DictObject>() else {
            return false;
        };

        equals_once(self, other, || {
            let (a, b) = (self.entries.borrow(), other.entries.borrow());

            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| v.equals(other)))
        })
    }
}
