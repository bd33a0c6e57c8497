//! Native object kinds and the capability trait they implement.
//!
//! The evaluator never matches on concrete object types: indexing, `foreach`,
//! spread, `len()`, property access and equality all go through
//! [`LoxObject`].  A stdlib module adds a type by implementing the trait and
//! handing out `Value::Object`s.

pub mod dict;
pub mod enumeration;
pub mod list;
pub mod string;

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::value::Value;

/// Failure message of a capability; the evaluator attaches the line.
pub type ObjectResult<T> = Result<T, String>;

pub trait LoxObject {
    fn type_name(&self) -> &'static str;

    fn stringify(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    /// Property or bound method lookup.  `None` means undefined.
    fn get(self: Rc<Self>, _name: &str) -> Option<Value> {
        None
    }

    fn set(&self, name: &str, _value: Value) -> ObjectResult<()> {
        Err(format!(
            "Can't set property '{}' on {}.",
            name,
            self.type_name()
        ))
    }

    /// Elements visited by `foreach` and spread.
    fn iterate(&self) -> Option<Vec<Value>> {
        None
    }

    fn length(&self) -> Option<usize> {
        None
    }

    fn index(&self, _index: &Value) -> ObjectResult<Value> {
        Err(format!("Can't index {}.", self.type_name()))
    }

    /// Half‑open slice; bounds may be negative or out of range.
    fn slice(&self, _start: Option<i64>, _end: Option<i64>) -> ObjectResult<Value> {
        Err(format!("Can't slice {}.", self.type_name()))
    }

    fn set_index(&self, _index: &Value, _value: Value) -> ObjectResult<()> {
        Err(format!("Can't assign to an index of {}.", self.type_name()))
    }

    /// Structural equality with another object.  Identity is checked by
    /// the caller first.
    fn equals(&self, _other: &dyn LoxObject) -> bool {
        false
    }
}

thread_local! {
    /// Containers being rendered (`(object, 0)`) or compared (`(left, right)`)
    /// further up the current call stack.
    static ACTIVE: RefCell<HashSet<(usize, usize)>> = RefCell::new(HashSet::new());
}

struct ActiveGuard((usize, usize));

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let _ = ACTIVE.try_with(|active| active.borrow_mut().remove(&self.0));
    }
}

/// Run `f` with `key` marked active, or return `None` if it already is.
fn unless_active<T>(key: (usize, usize), f: impl FnOnce() -> T) -> Option<T> {
    if !ACTIVE.with(|active| active.borrow_mut().insert(key)) {
        return None;
    }

    let _guard = ActiveGuard(key);

    Some(f())
}

fn address<T>(object: &T) -> usize {
    object as *const T as usize
}

/// Render a container, printing `placeholder` where it contains itself.
pub fn stringify_once<T>(
    object: &T,
    placeholder: &str,
    render: impl FnOnce() -> String,
) -> String {
    unless_active((address(object), 0), render).unwrap_or_else(|| placeholder.to_string())
}

/// Compare two containers element-wise.  A pair already under comparison
/// counts as equal, so cyclic structures with the same shape are equal.
pub fn equals_once<T>(left: &T, right: &T, compare: impl FnOnce() -> bool) -> bool {
    unless_active((address(left), address(right)), compare).unwrap_or(true)
}

/// Integer index argument.
pub fn expect_index(index: &Value) -> ObjectResult<i64> {
    match index {
        Value::Int(n) => Ok(*n),
        other => Err(format!("Index must be an integer, got {}.", other.type_name())),
    }
}

/// Resolve a possibly negative index against `len`.
pub fn normalize_index(index: i64, len: usize) -> ObjectResult<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };

    if (0..len).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err("Index out of range.".to_string())
    }
}

/// Resolve slice bounds against `len`: negatives count from the end, both
/// ends are clamped, and an inverted range is empty.
pub fn slice_bounds(start: Option<i64>, end: Option<i64>, len: usize) -> (usize, usize) {
    let clamp = |bound: i64| -> usize {
        let resolved = if bound < 0 { len as i64 + bound } else { bound };
        resolved.clamp(0, len as i64) as usize
    };

    let start = start.map_or(0, clamp);
    let end = end.map_or(len, clamp);

    (start, end.max(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_indices_count_from_the_end() {
        assert_eq!(normalize_index(-1, 3), Ok(2));
        assert_eq!(normalize_index(0, 3), Ok(0));
        assert!(normalize_index(3, 3).is_err());
        assert!(normalize_index(-4, 3).is_err());
    }

    #[test]
    fn slice_bounds_clamp() {
        assert_eq!(slice_bounds(None, None, 5), (0, 5));
        assert_eq!(slice_bounds(Some(-2), None, 5), (3, 5));
        assert_eq!(slice_bounds(Some(1), Some(100), 5), (1, 5));
        assert_eq!(slice_bounds(Some(4), Some(2), 5), (4, 4));
        assert_eq!(slice_bounds(Some(-100), Some(2), 5), (0, 2));
    }

    #[test]
    fn nested_renders_of_the_same_object_are_cut_short() {
        let outer = 1u8;
        let rendered = stringify_once(&outer, "[...]", || {
            format!("[{}]", stringify_once(&outer, "[...]", || "inner".to_string()))
        });

        assert_eq!(rendered, "[[...]]");

        // the mark is cleared once the render finishes
        assert_eq!(stringify_once(&outer, "[...]", || "again".to_string()), "again");
    }
}
