//! Built‑in behaviour of string values: methods, indexing and slicing.
//!
//! Strings are indexed by character, not by byte.

use std::rc::Rc;

use crate::callable::{Arity, NativeFunction};
use crate::object::{expect_index, normalize_index, slice_bounds, ObjectResult};
use crate::value::Value;

/// Bound method `name` of the string `s`, if there is one.
pub fn method(s: Rc<str>, name: &str) -> Option<Value> {
    let native = match name {
        "len" => NativeFunction::new("len", Arity::Fixed(0), move |_, _, _| {
            Ok(Value::Int(s.chars().count() as i64))
        }),

        "upper" => NativeFunction::new("upper", Arity::Fixed(0), move |_, _, _| {
            Ok(Value::from(s.to_uppercase()))
        }),

        "lower" => NativeFunction::new("lower", Arity::Fixed(0), move |_, _, _| {
            Ok(Value::from(s.to_lowercase()))
        }),

        "trim" => NativeFunction::new("trim", Arity::Fixed(0), move |_, _, _| {
            Ok(Value::from(s.trim()))
        }),

        "contains" => NativeFunction::new("contains", Arity::Fixed(1), move |_, _, args| {
            let needle = args[0].to_string();
            Ok(Value::Bool(s.contains(needle.as_str())))
        }),

        // "" splits into characters
        "split" => NativeFunction::new("split", Arity::Fixed(1), move |_, _, args| {
            let separator = args[0].to_string();

            let parts: Vec<Value> = if separator.is_empty() {
                s.chars().map(|c| Value::from(c.to_string())).collect()
            } else {
                s.split(separator.as_str()).map(Value::from).collect()
            };

            Ok(Value::list(parts))
        }),

        _ => return None,
    };

    Some(Value::Native(Rc::new(native)))
}

pub fn index(s: &str, index: &Value) -> ObjectResult<Value> {
    let i = normalize_index(expect_index(index)?, s.chars().count())?;

    Ok(s
        .chars()
        .nth(i)
        .map_or(Value::Nil, |c| Value::from(c.to_string())))
}

pub fn slice(s: &str, start: Option<i64>, end: Option<i64>) -> Value {
    let (start, end) = slice_bounds(start, end, s.chars().count());

    Value::from(s.chars().skip(start).take(end - start).collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_by_character() {
        assert_eq!(index("héllo", &Value::Int(1)), Ok(Value::from("é")));
        assert_eq!(index("héllo", &Value::Int(-1)), Ok(Value::from("o")));
        assert!(index("abc", &Value::Int(3)).is_err());
        assert!(index("abc", &Value::Float(1.0)).is_err());
    }

    #[test]
    fn slicing_clamps() {
        assert_eq!(slice("hello", Some(1), Some(3)), Value::from("el"));
        assert_eq!(slice("hello", Some(-3), None), Value::from("llo"));
        assert_eq!(slice("hello", Some(4), Some(1)), Value::from(""));
    }

    #[test]
    fn unknown_methods_are_absent() {
        assert!(method(Rc::from("x"), "nope").is_none());
        assert!(method(Rc::from("x"), "upper").is_some());
    }
}
