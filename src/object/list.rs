use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::callable::{Arity, NativeFunction};
use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::Interpreter;
use crate::object::{
    equals_once, expect_index, normalize_index, slice_bounds, stringify_once, LoxObject,
    ObjectResult,
};
use crate::token::Token;
use crate::value::Value;

/// Mutable, shared sequence.  Copies of the value alias the same storage.
#[derive(Debug, Default)]
pub struct ListObject {
    items: RefCell<Vec<Value>>,
}

impl ListObject {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items: RefCell::new(items),
        }
    }

    pub fn items(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    pub fn push(&self, value: Value) {
        self.items.borrow_mut().push(value);
    }
}

/// Native method closing over the list it was read from.
fn method(
    list: &Rc<ListObject>,
    name: &'static str,
    arity: Arity,
    body: fn(&ListObject, &mut Interpreter, &Token, Vec<Value>) -> RuntimeResult<Value>,
) -> Value {
    let list = list.clone();

    Value::Native(Rc::new(NativeFunction::new(
        name,
        arity,
        move |interpreter, paren, args| body(&list, interpreter, paren, args),
    )))
}

impl LoxObject for ListObject {
    fn type_name(&self) -> &'static str {
        "list"
    }

    fn stringify(&self) -> String {
        stringify_once(self, "[...]", || {
            let items: Vec<String> = self.items.borrow().iter().map(Value::repr).collect();

            format!("[{}]", items.join(", "))
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get(self: Rc<Self>, name: &str) -> Option<Value> {
        let value = match name {
            "len" => method(&self, "len", Arity::Fixed(0), |list, _, _, _| {
                Ok(Value::Int(list.items.borrow().len() as i64))
            }),

            "push" => method(&self, "push", Arity::AtLeast(1), |list, _, _, args| {
                list.items.borrow_mut().extend(args);
                Ok(Value::Nil)
            }),

            "pop" => method(&self, "pop", Arity::Fixed(0), |list, _, paren, _| {
                list.items
                    .borrow_mut()
                    .pop()
                    .ok_or_else(|| RuntimeError::new(paren, "Can't pop from an empty list."))
            }),

            "contains" => method(&self, "contains", Arity::Fixed(1), |list, _, _, args| {
                let found = list.items.borrow().iter().any(|item| item.equals(&args[0]));
                Ok(Value::Bool(found))
            }),

            "join" => method(&self, "join", Arity::Fixed(1), |list, _, _, args| {
                let separator = args[0].to_string();
                let parts: Vec<String> = list.items.borrow().iter().map(Value::to_string).collect();
                Ok(Value::from(parts.join(&separator)))
            }),

            "reverse" => method(&self, "reverse", Arity::Fixed(0), |list, _, _, _| {
                list.items.borrow_mut().reverse();
                Ok(Value::Nil)
            }),

            "map" => method(&self, "map", Arity::Fixed(1), |list, interpreter, paren, args| {
                let mut mapped = Vec::new();

                for item in list.items() {
                    mapped.push(interpreter.call_value(&args[0], paren, vec![item])?);
                }

                Ok(Value::list(mapped))
            }),

            "filter" => method(&self, "filter", Arity::Fixed(1), |list, interpreter, paren, args| {
                let mut kept = Vec::new();

                for item in list.items() {
                    if interpreter
                        .call_value(&args[0], paren, vec![item.clone()])?
                        .is_truthy()
                    {
                        kept.push(item);
                    }
                }

                Ok(Value::list(kept))
            }),

            _ => return None,
        };

        Some(value)
    }

    fn iterate(&self) -> Option<Vec<Value>> {
        Some(self.items())
    }

    fn length(&self) -> Option<usize> {
        Some(self.items.borrow().len())
    }

    fn index(&self, index: &Value) -> ObjectResult<Value> {
        let items = self.items.borrow();
        let i = normalize_index(expect_index(index)?, items.len())?;

        Ok(items[i].clone())
    }

    fn slice(&self, start: Option<i64>, end: Option<i64>) -> ObjectResult<Value> {
        let items = self.items.borrow();
        let (start, end) = slice_bounds(start, end, items.len());

        Ok(Value::list(items[start..end].to_vec()))
    }

    fn set_index(&self, index: &Value, value: Value) -> ObjectResult<()> {
        let mut items = self.items.borrow_mut();
        let i = normalize_index(expect_index(index)?, items.len())?;

        items[i] = value;

        Ok(())
    }

    fn equals(&self, other: &dyn LoxObject) -> bool {
        let Some(other) = other.as_any().downcast_ref::<ListObject>() else {
            return false;
        };

        equals_once(self, other, || {
            let (a, b) = (self.items.borrow(), other.items.borrow());

            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
        })
    }
}
