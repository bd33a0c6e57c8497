//! Global functions available to every program.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::Utc;
use log::{debug, info};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::callable::Arity;
use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::Interpreter;
use crate::numeric;
use crate::token::Token;
use crate::value::Value;

/// Register every builtin in the interpreter's global scope.
pub fn install(interpreter: &mut Interpreter) {
    interpreter.define_native("clock", Arity::Fixed(0), |_, _, _| {
        debug!("Calling native function 'clock'");

        let now = Utc::now();
        let timestamp = now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9;

        info!("Native function 'clock' returned: {}", timestamp);

        Ok(Value::Float(timestamp))
    });

    interpreter.define_native("type", Arity::Fixed(1), |_, _, args| {
        Ok(Value::from(args[0].type_name()))
    });

    interpreter.define_native("len", Arity::Fixed(1), |_, paren, args| {
        let length = args[0].length().ok_or_else(|| {
            RuntimeError::new(
                paren,
                format!("Can't take the length of {}.", args[0].type_name()),
            )
        })?;

        Ok(Value::Int(length as i64))
    });

    interpreter.define_native("str", Arity::Fixed(1), |_, _, args| {
        Ok(Value::from(args[0].to_string()))
    });

    interpreter.define_native("int", Arity::Fixed(1), |_, paren, args| to_int(paren, &args[0]));

    interpreter.define_native("float", Arity::Fixed(1), |_, paren, args| {
        to_float(paren, &args[0])
    });

    interpreter.define_native("bigint", Arity::Fixed(1), |_, paren, args| {
        to_bigint(paren, &args[0]).map(Value::from)
    });

    interpreter.define_native("bigfloat", Arity::Fixed(1), |_, paren, args| {
        to_bigfloat(paren, &args[0]).map(Value::from)
    });

    interpreter.define_native("list", Arity::AtLeast(0), |_, _, args| Ok(Value::list(args)));

    interpreter.define_native("range", Arity::AtLeast(1), range);
}

fn cannot_convert(paren: &Token, value: &Value, target: &str) -> RuntimeError {
    RuntimeError::new(
        paren,
        format!("Can't convert {} to {}.", value.type_name(), target),
    )
}

/// Truncating conversion; values outside 64 bits stay big.
fn to_int(paren: &Token, value: &Value) -> RuntimeResult<Value> {
    match value {
        Value::Int(_) => Ok(value.clone()),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(n) => match BigInt::from_f64(n.trunc()) {
            Some(n) => Ok(numeric::demote(n)),
            None => Err(cannot_convert(paren, value, "int")),
        },
        Value::Str(s) => match i64::from_str(s.trim()) {
            Ok(n) => Ok(Value::Int(n)),
            Err(_) => to_bigint(paren, value).map(numeric::demote),
        },
        _ => to_bigint(paren, value).map(numeric::demote),
    }
}

fn to_float(paren: &Token, value: &Value) -> RuntimeResult<Value> {
    let converted = match value {
        Value::Str(s) => f64::from_str(s.trim()).ok(),
        other => numeric::to_f64(other),
    };

    converted
        .map(Value::Float)
        .ok_or_else(|| cannot_convert(paren, value, "float"))
}

fn to_bigint(paren: &Token, value: &Value) -> RuntimeResult<BigInt> {
    let converted = match value {
        Value::Int(n) => Some(BigInt::from(*n)),
        Value::BigInt(n) => Some(n.as_ref().clone()),
        Value::Float(n) => BigInt::from_f64(n.trunc()),
        Value::BigFloat(n) => Some(n.with_scale(0).into_bigint_and_exponent().0),
        Value::Str(s) => BigInt::from_str(s.trim()).ok(),
        _ => None,
    };

    converted.ok_or_else(|| cannot_convert(paren, value, "bigint"))
}

fn to_bigfloat(paren: &Token, value: &Value) -> RuntimeResult<BigDecimal> {
    let converted = match value {
        Value::Str(s) => BigDecimal::from_str(s.trim()).ok(),
        other => numeric::to_bigdecimal(other),
    };

    converted.ok_or_else(|| cannot_convert(paren, value, "bigfloat"))
}

/// `range(end)` or `range(start, end)`: the half‑open interval as a list.
fn range(_: &mut Interpreter, paren: &Token, args: Vec<Value>) -> RuntimeResult<Value> {
    if args.len() > 2 {
        return Err(RuntimeError::new(
            paren,
            format!("Expected at most 2 arguments but got {}.", args.len()),
        ));
    }

    let mut bounds = Vec::with_capacity(2);

    for arg in &args {
        match arg {
            Value::Int(n) => bounds.push(*n),
            Value::BigInt(n) => match n.to_i64() {
                Some(n) => bounds.push(n),
                None => return Err(RuntimeError::new(paren, "Range bound out of range.")),
            },
            other => {
                return Err(RuntimeError::new(
                    paren,
                    format!("Range bounds must be integers, got {}.", other.type_name()),
                ))
            }
        }
    }

    let (start, end) = match bounds.as_slice() {
        [end] => (0, *end),
        [start, end] => (*start, *end),
        _ => (0, 0),
    };

    Ok(Value::list((start..end).map(Value::Int).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paren() -> Token {
        Token::synthetic(")", 1)
    }

    #[test]
    fn int_truncates_and_parses() {
        assert_eq!(to_int(&paren(), &Value::Float(3.9)).unwrap(), Value::Int(3));
        assert_eq!(to_int(&paren(), &Value::from(" 42 ")).unwrap(), Value::Int(42));
        assert_eq!(
            to_int(&paren(), &Value::from("99999999999999999999")).unwrap(),
            Value::from(BigInt::from_str("99999999999999999999").unwrap())
        );
        assert!(to_int(&paren(), &Value::from("x")).is_err());
        assert!(to_int(&paren(), &Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn bigint_is_never_demoted() {
        let value = Value::from(to_bigint(&paren(), &Value::Int(2)).unwrap());

        assert_eq!(value.type_name(), "bigint");
    }

    #[test]
    fn float_parses_strings() {
        assert_eq!(to_float(&paren(), &Value::from("2.5")).unwrap(), Value::Float(2.5));
        assert!(to_float(&paren(), &Value::Nil).is_err());
    }
}
