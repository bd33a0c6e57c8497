//! Numeric tower: `Int` → `BigInt`, `Float` → `BigFloat`.
//!
//! Results take the widest rank of the two operands:
//!
//! | left \ right | Int     | Float    | BigInt   | BigFloat |
//! |--------------|---------|----------|----------|----------|
//! | Int          | Int*    | Float    | BigInt   | BigFloat |
//! | Float        | Float   | Float    | BigFloat | BigFloat |
//! | BigInt       | BigInt  | BigFloat | BigInt   | BigFloat |
//! | BigFloat     | BigFloat| BigFloat | BigFloat | BigFloat |
//!
//! `*` Int arithmetic that overflows is redone in `BigInt`.
//!
//! Every function returns a plain `&'static str` message on failure; the
//! evaluator attaches the operator token.

use std::cmp::Ordering;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, One, Pow, ToPrimitive, Zero};

use crate::value::Value;

pub const DIVISION_BY_ZERO: &str = "Division by zero.";
const NOT_NUMBERS: &str = "Operands must be numbers.";
const NOT_INTEGERS: &str = "Operands must be integers.";
const SHIFT_RANGE: &str = "Shift count out of range.";
const EXPONENT_RANGE: &str = "Exponent out of range.";

pub type NumResult = Result<Value, &'static str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Int,
    Float,
    BigInt,
    BigFloat,
}

fn rank_of(value: &Value) -> Option<Rank> {
    match value {
        Value::Int(_) => Some(Rank::Int),
        Value::Float(_) => Some(Rank::Float),
        Value::BigInt(_) => Some(Rank::BigInt),
        Value::BigFloat(_) => Some(Rank::BigFloat),
        _ => None,
    }
}

fn common_rank(left: &Value, right: &Value) -> Option<Rank> {
    let (a, b) = (rank_of(left)?, rank_of(right)?);

    Some(match (a, b) {
        (Rank::BigInt, Rank::Float) | (Rank::Float, Rank::BigInt) => Rank::BigFloat,
        _ => a.max(b),
    })
}

pub fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        Value::BigInt(n) => n.to_f64(),
        Value::BigFloat(n) => n.to_f64(),
        _ => None,
    }
}

pub fn to_bigint(value: &Value) -> Option<BigInt> {
    match value {
        Value::Int(n) => Some(BigInt::from(*n)),
        Value::BigInt(n) => Some(n.as_ref().clone()),
        _ => None,
    }
}

/// `None` for non‑numbers and for non‑finite floats.
pub fn to_bigdecimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Int(n) => Some(BigDecimal::from(*n)),
        Value::Float(n) => BigDecimal::from_f64(*n),
        Value::BigInt(n) => Some(BigDecimal::from(n.as_ref().clone())),
        Value::BigFloat(n) => Some(n.as_ref().clone()),
        _ => None,
    }
}

/// Apply `+ - * / % **` to two numeric values.
pub fn arithmetic(op: ArithOp, left: &Value, right: &Value) -> NumResult {
    if op == ArithOp::Pow {
        return power(left, right);
    }

    match common_rank(left, right).ok_or(NOT_NUMBERS)? {
        Rank::Int => match (left, right) {
            (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b),
            _ => Err(NOT_NUMBERS),
        },

        Rank::Float => float_arithmetic(op, left, right),

        Rank::BigInt => match (to_bigint(left), to_bigint(right)) {
            (Some(a), Some(b)) => bigint_arithmetic(op, &a, &b),
            _ => Err(NOT_NUMBERS),
        },

        Rank::BigFloat => match (to_bigdecimal(left), to_bigdecimal(right)) {
            (Some(a), Some(b)) => bigfloat_arithmetic(op, &a, &b),
            // NaN or infinity cannot be represented exactly
            _ => float_arithmetic(op, left, right),
        },
    }
}

fn int_arithmetic(op: ArithOp, a: i64, b: i64) -> NumResult {
    if matches!(op, ArithOp::Div | ArithOp::Rem) && b == 0 {
        return Err(DIVISION_BY_ZERO);
    }

    let checked = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        ArithOp::Div => a.checked_div(b),
        ArithOp::Rem => a.checked_rem(b),
        ArithOp::Pow => return power(&Value::Int(a), &Value::Int(b)),
    };

    match checked {
        Some(n) => Ok(Value::Int(n)),
        None => bigint_arithmetic(op, &BigInt::from(a), &BigInt::from(b)),
    }
}

fn float_arithmetic(op: ArithOp, left: &Value, right: &Value) -> NumResult {
    let (a, b) = match (to_f64(left), to_f64(right)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(NOT_NUMBERS),
    };

    Ok(Value::Float(match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
        ArithOp::Pow => a.powf(b),
    }))
}

fn bigint_arithmetic(op: ArithOp, a: &BigInt, b: &BigInt) -> NumResult {
    let result = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div | ArithOp::Rem if b.is_zero() => return Err(DIVISION_BY_ZERO),
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
        ArithOp::Pow => return bigint_pow(a, b),
    };

    Ok(Value::from(result))
}

fn bigfloat_arithmetic(op: ArithOp, a: &BigDecimal, b: &BigDecimal) -> NumResult {
    let result = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div | ArithOp::Rem if b.is_zero() => return Err(DIVISION_BY_ZERO),
        ArithOp::Div => a / b,
        ArithOp::Rem => a.clone() % b.clone(),
        ArithOp::Pow => match b.to_i64() {
            Some(exp) if b.is_integer() => return bigfloat_pow(a, exp),
            _ => return pow_f64(&Value::from(a.clone()), &Value::from(b.clone())),
        },
    };

    Ok(Value::from(result))
}

/// `**`, right operand is the exponent.
pub fn power(base: &Value, exponent: &Value) -> NumResult {
    match (base, exponent) {
        (Value::Int(a), Value::Int(b)) if *b < 0 => Ok(Value::Float((*a as f64).powf(*b as f64))),

        (Value::Int(a), Value::Int(b)) => {
            let exp = u32::try_from(*b).map_err(|_| EXPONENT_RANGE)?;

            match a.checked_pow(exp) {
                Some(n) => Ok(Value::Int(n)),
                None => Ok(Value::from(Pow::pow(BigInt::from(*a), exp))),
            }
        }

        (Value::Int(_) | Value::BigInt(_), Value::Int(_) | Value::BigInt(_)) => {
            match (to_bigint(base), to_bigint(exponent)) {
                (Some(a), Some(b)) => bigint_pow(&a, &b),
                _ => Err(NOT_NUMBERS),
            }
        }

        (Value::BigFloat(a), Value::Int(b)) => bigfloat_pow(a, *b),

        (Value::BigFloat(a), Value::BigInt(b)) => {
            bigfloat_pow(a, b.to_i64().ok_or(EXPONENT_RANGE)?)
        }

        _ => pow_f64(base, exponent),
    }
}

fn pow_f64(base: &Value, exponent: &Value) -> NumResult {
    match (to_f64(base), to_f64(exponent)) {
        (Some(a), Some(b)) => Ok(Value::Float(a.powf(b))),
        _ => Err(NOT_NUMBERS),
    }
}

fn bigint_pow(base: &BigInt, exponent: &BigInt) -> NumResult {
    if exponent.sign() == Sign::Minus {
        return Err("Negative exponent for bigint.");
    }

    let exp = exponent.to_u32().ok_or(EXPONENT_RANGE)?;

    Ok(Value::from(Pow::pow(base, exp)))
}

/// Exponentiation by repeated squaring.
fn bigfloat_pow(base: &BigDecimal, exponent: i64) -> NumResult {
    let mut result = BigDecimal::one();
    let mut square = base.clone();
    let mut n = exponent.unsigned_abs();

    while n > 0 {
        if n & 1 == 1 {
            result = &result * &square;
        }

        n >>= 1;

        if n > 0 {
            square = &square * &square;
        }
    }

    if exponent < 0 {
        if result.is_zero() {
            return Err(DIVISION_BY_ZERO);
        }

        result = BigDecimal::one() / result;
    }

    Ok(Value::from(result))
}

/// Ordering of two numbers; `None` if either is not a number or the
/// comparison involves NaN.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match common_rank(left, right)? {
        Rank::Int => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            _ => None,
        },

        Rank::Float => to_f64(left)?.partial_cmp(&to_f64(right)?),

        Rank::BigInt => Some(to_bigint(left)?.cmp(&to_bigint(right)?)),

        Rank::BigFloat => match (to_bigdecimal(left), to_bigdecimal(right)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => to_f64(left)?.partial_cmp(&to_f64(right)?),
        },
    }
}

/// Numeric equality, `None` unless both sides are numbers.
pub fn equals(left: &Value, right: &Value) -> Option<bool> {
    common_rank(left, right)?;

    Some(compare(left, right) == Some(Ordering::Equal))
}

pub fn negate(value: &Value) -> NumResult {
    match value {
        Value::Int(n) => Ok(n
            .checked_neg()
            .map(Value::Int)
            .unwrap_or_else(|| Value::from(-BigInt::from(*n)))),
        Value::Float(n) => Ok(Value::Float(-n)),
        Value::BigInt(n) => Ok(Value::from(-n.as_ref())),
        Value::BigFloat(n) => Ok(Value::from(-n.as_ref())),
        _ => Err("Operand must be a number."),
    }
}

pub fn bit_not(value: &Value) -> NumResult {
    match value {
        Value::Int(n) => Ok(Value::Int(!n)),
        Value::BigInt(n) => Ok(Value::from(!n.as_ref())),
        _ => Err("Operand must be an integer."),
    }
}

/// `& | ^ << >>` on `Int`/`BigInt` operands.
pub fn bitwise(op: BitOp, left: &Value, right: &Value) -> NumResult {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return int_bitwise(op, *a, *b);
    }

    let (a, b) = match (to_bigint(left), to_bigint(right)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(NOT_INTEGERS),
    };

    let result = match op {
        BitOp::And => a & b,
        BitOp::Or => a | b,
        BitOp::Xor => a ^ b,
        BitOp::Shl | BitOp::Shr => {
            let count = b.to_u32().ok_or(SHIFT_RANGE)?;

            if op == BitOp::Shl {
                a << count
            } else {
                a >> count
            }
        }
    };

    Ok(Value::from(result))
}

fn int_bitwise(op: BitOp, a: i64, b: i64) -> NumResult {
    let shift = || u32::try_from(b).ok().filter(|n| *n < 64).ok_or(SHIFT_RANGE);

    Ok(match op {
        BitOp::And => Value::Int(a & b),
        BitOp::Or => Value::Int(a | b),
        BitOp::Xor => Value::Int(a ^ b),
        BitOp::Shr => Value::Int(a >> shift()?),
        BitOp::Shl => {
            let count = shift()?;
            let shifted = a << count;

            if shifted >> count == a {
                Value::Int(shifted)
            } else {
                Value::from(BigInt::from(a) << count)
            }
        }
    })
}

/// Wrap a `BigInt` result as an `Int` when it fits.
pub fn demote(n: BigInt) -> Value {
    match n.to_i64() {
        Some(small) => Value::Int(small),
        None => Value::BigInt(Rc::new(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn big(s: &str) -> Value {
        Value::from(BigInt::from_str(s).unwrap())
    }

    #[test]
    fn int_overflow_promotes_to_bigint() {
        let sum = arithmetic(ArithOp::Add, &Value::Int(i64::MAX), &Value::Int(1)).unwrap();

        assert!(matches!(sum, Value::BigInt(_)));
        assert_eq!(sum.to_string(), "9223372036854775808");
    }

    #[test]
    fn int_division_truncates_and_rejects_zero() {
        assert_eq!(
            arithmetic(ArithOp::Div, &Value::Int(7), &Value::Int(2)).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            arithmetic(ArithOp::Div, &Value::Int(-7), &Value::Int(2)).unwrap(),
            Value::Int(-3)
        );
        assert_eq!(
            arithmetic(ArithOp::Rem, &Value::Int(1), &Value::Int(0)),
            Err(DIVISION_BY_ZERO)
        );
    }

    #[test]
    fn float_division_by_zero_is_infinite() {
        let q = arithmetic(ArithOp::Div, &Value::Float(1.0), &Value::Int(0)).unwrap();

        assert!(matches!(q, Value::Float(f) if f.is_infinite()));
    }

    #[test]
    fn mixed_ranks_widen() {
        let r = arithmetic(ArithOp::Add, &Value::Int(1), &Value::Float(2.5)).unwrap();
        assert!(matches!(r, Value::Float(f) if f == 3.5));

        let r = arithmetic(ArithOp::Mul, &big("3"), &Value::Float(0.5)).unwrap();
        assert!(matches!(r, Value::BigFloat(_)));
        assert_eq!(r, Value::Float(1.5));
    }

    #[test]
    fn powers() {
        assert_eq!(power(&Value::Int(2), &Value::Int(10)).unwrap(), Value::Int(1024));
        assert_eq!(power(&Value::Int(2), &Value::Int(-1)).unwrap(), Value::Float(0.5));
        assert_eq!(
            power(&big("2"), &Value::Int(64)).unwrap().to_string(),
            "18446744073709551616"
        );
        assert_eq!(
            power(&Value::Int(2), &Value::Int(64)).unwrap().to_string(),
            "18446744073709551616"
        );

        let half = Value::from(BigDecimal::from_str("0.5").unwrap());
        assert_eq!(power(&half, &Value::Int(3)).unwrap(), Value::Float(0.125));
    }

    #[test]
    fn comparisons_cross_ranks() {
        assert_eq!(
            compare(&Value::Int(1), &Value::Float(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(compare(&big("100"), &Value::Int(99)), Some(Ordering::Greater));
        assert_eq!(compare(&Value::Float(f64::NAN), &Value::Int(1)), None);
        assert_eq!(compare(&Value::from("a"), &Value::Int(1)), None);
    }

    #[test]
    fn shifts_check_their_range() {
        assert_eq!(
            bitwise(BitOp::Shl, &Value::Int(1), &Value::Int(4)).unwrap(),
            Value::Int(16)
        );
        assert_eq!(
            bitwise(BitOp::Shl, &Value::Int(1), &Value::Int(64)),
            Err(SHIFT_RANGE)
        );
        assert_eq!(
            bitwise(BitOp::And, &Value::Float(1.0), &Value::Int(1)),
            Err(NOT_INTEGERS)
        );
    }
}
