//! Compile-time constant values.
//!
//! These are the values that can appear as literals, immediate operands or resolved
//! constant bindings. Arithmetic on them is *checked*: an operation that would overflow,
//! divide by zero or leave the domain of a math function returns `None`, which the
//! constant propagation pass treats as "not a constant" rather than guessing.

use std::fmt;

use serde::Serialize;

use crate::ir::Type;

/// Largest integer magnitude that converts to `f64` without rounding.
const MAX_EXACT_FLOAT_INT: u64 = 1 << 53;

/// A constant value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConstValue {
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// String literal.
    Str(String),
    /// The unit value.
    Nothing,
}

impl ConstValue {
    /// Returns the concrete runtime type of this constant.
    #[must_use]
    pub fn runtime_type(&self) -> Type {
        match self {
            Self::Int(_) => Type::int(),
            Self::Float(_) => Type::float(),
            Self::Bool(_) => Type::bool(),
            Self::Str(_) => Type::string(),
            Self::Nothing => Type::nothing(),
        }
    }

    /// Returns the constant as a bool if it is one.
    ///
    /// Integers are deliberately not truthy: only a literal boolean decides a branch.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the constant as an integer if it is one.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the constant widened to a float, for integer and float constants.
    ///
    /// Integers beyond `±2^53` have no exact float image and return `None`, so mixed
    /// arithmetic and comparisons on them are never folded.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(v) if v.unsigned_abs() <= MAX_EXACT_FLOAT_INT => Some(*v as f64),
            Self::Int(_) => None,
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns `true` for integer and float constants.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Attempts to negate this constant.
    #[must_use]
    pub fn negate(&self) -> Option<Self> {
        match self {
            Self::Int(v) => v.checked_neg().map(Self::Int),
            Self::Float(v) => Some(Self::Float(-v)),
            _ => None,
        }
    }

    /// Attempts to add two constants.
    #[must_use]
    pub fn add(&self, other: &Self) -> Option<Self> {
        self.arith(other, i64::checked_add, |a, b| a + b)
    }

    /// Attempts to subtract two constants.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Option<Self> {
        self.arith(other, i64::checked_sub, |a, b| a - b)
    }

    /// Attempts to multiply two constants.
    #[must_use]
    pub fn mul(&self, other: &Self) -> Option<Self> {
        self.arith(other, i64::checked_mul, |a, b| a * b)
    }

    /// Attempts true division, which always produces a float.
    #[must_use]
    pub fn div(&self, other: &Self) -> Option<Self> {
        let a = self.as_float()?;
        let b = other.as_float()?;
        if b == 0.0 {
            return None;
        }
        finite(a / b)
    }

    /// Attempts truncating integer division.
    #[must_use]
    pub fn int_div(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.checked_div(*b).map(Self::Int),
            _ => None,
        }
    }

    /// Attempts the remainder of truncating division (sign follows the dividend).
    #[must_use]
    pub fn rem(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.checked_rem(*b).map(Self::Int),
            (Self::Float(_), _) | (_, Self::Float(_)) => {
                let a = self.as_float()?;
                let b = other.as_float()?;
                if b == 0.0 {
                    return None;
                }
                finite(a % b)
            }
            _ => None,
        }
    }

    /// Attempts the floored modulus (sign follows the divisor).
    #[must_use]
    pub fn modulo(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => {
                let r = a.checked_rem(*b)?;
                if r != 0 && ((r < 0) != (*b < 0)) {
                    r.checked_add(*b).map(Self::Int)
                } else {
                    Some(Self::Int(r))
                }
            }
            _ => None,
        }
    }

    /// Attempts exponentiation. Integer powers require a non-negative exponent.
    #[must_use]
    pub fn pow(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => {
                let exp = u32::try_from(*b).ok()?;
                a.checked_pow(exp).map(Self::Int)
            }
            _ => finite(self.as_float()?.powf(other.as_float()?)),
        }
    }

    /// Compares two constants for equality.
    ///
    /// Mixed integer/float comparisons compare numerically.
    #[must_use]
    #[allow(clippy::float_cmp)] // Exact comparison is correct for constant propagation
    pub fn equals(&self, other: &Self) -> Option<Self> {
        let result = match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Nothing, Self::Nothing) => true,
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_float()? == b.as_float()?,
            _ => return None,
        };
        Some(Self::Bool(result))
    }

    /// Compares two constants for less-than.
    #[must_use]
    pub fn less_than(&self, other: &Self) -> Option<Self> {
        let result = match (self, other) {
            (Self::Int(a), Self::Int(b)) => a < b,
            (Self::Str(a), Self::Str(b)) => a < b,
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_float()? < b.as_float()?,
            _ => return None,
        };
        Some(Self::Bool(result))
    }

    /// Compares two constants for less-than-or-equal.
    #[must_use]
    pub fn less_equal(&self, other: &Self) -> Option<Self> {
        let lt = self.less_than(other)?.as_bool()?;
        let eq = self.equals(other)?.as_bool()?;
        Some(Self::Bool(lt || eq))
    }

    /// Logical or bitwise NOT.
    #[must_use]
    pub fn not(&self) -> Option<Self> {
        match self {
            Self::Bool(b) => Some(Self::Bool(!b)),
            Self::Int(v) => Some(Self::Int(!v)),
            _ => None,
        }
    }

    /// Logical or bitwise AND.
    #[must_use]
    pub fn and(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(Self::Bool(*a && *b)),
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a & b)),
            _ => None,
        }
    }

    /// Logical or bitwise OR.
    #[must_use]
    pub fn or(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(Self::Bool(*a || *b)),
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a | b)),
            _ => None,
        }
    }

    /// Logical or bitwise XOR.
    #[must_use]
    pub fn xor(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(Self::Bool(a ^ b)),
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a ^ b)),
            _ => None,
        }
    }

    /// Applies a float function to a numeric constant, refusing non-finite results.
    #[must_use]
    pub fn map_float(&self, f: impl FnOnce(f64) -> f64) -> Option<Self> {
        finite(f(self.as_float()?))
    }

    /// Shared int/float arithmetic with float promotion for mixed operands.
    fn arith(
        &self,
        other: &Self,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Option<Self> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => int_op(*a, *b).map(Self::Int),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                finite(float_op(a.as_float()?, b.as_float()?))
            }
            _ => None,
        }
    }
}

/// Wraps a float result, refusing NaN and infinities.
fn finite(value: f64) -> Option<ConstValue> {
    value.is_finite().then_some(ConstValue::Float(value))
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Nothing => write!(f, "nothing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_integer_arithmetic() {
        assert_eq!(
            ConstValue::Int(2).add(&ConstValue::Int(3)),
            Some(ConstValue::Int(5))
        );
        assert_eq!(ConstValue::Int(i64::MAX).add(&ConstValue::Int(1)), None);
        assert_eq!(ConstValue::Int(i64::MIN).negate(), None);
        assert_eq!(ConstValue::Int(7).int_div(&ConstValue::Int(0)), None);
        assert_eq!(ConstValue::Int(2).pow(&ConstValue::Int(-1)), None);
        assert_eq!(
            ConstValue::Int(2).pow(&ConstValue::Int(10)),
            Some(ConstValue::Int(1024))
        );
    }

    #[test]
    fn test_mixed_comparison_beyond_exact_floats() {
        let big = ConstValue::Int(9_007_199_254_740_993);
        let near = ConstValue::Float(9_007_199_254_740_992.0);
        assert_eq!(big.less_than(&near), None);
        assert_eq!(near.less_than(&big), None);
        assert_eq!(big.equals(&near), None);
        assert_eq!(big.add(&ConstValue::Float(1.0)), None);

        let edge = ConstValue::Int(9_007_199_254_740_992);
        assert_eq!(edge.equals(&near), Some(ConstValue::Bool(true)));
        assert_eq!(
            ConstValue::Int(-3).less_than(&ConstValue::Float(-2.5)),
            Some(ConstValue::Bool(true))
        );
    }

    #[test]
    fn test_float_promotion() {
        assert_eq!(
            ConstValue::Int(1).add(&ConstValue::Float(0.5)),
            Some(ConstValue::Float(1.5))
        );
        assert_eq!(
            ConstValue::Int(7).div(&ConstValue::Int(2)),
            Some(ConstValue::Float(3.5))
        );
        assert_eq!(ConstValue::Float(1.0).div(&ConstValue::Float(0.0)), None);
    }

    #[test]
    fn test_modulo_sign() {
        assert_eq!(
            ConstValue::Int(-7).rem(&ConstValue::Int(3)),
            Some(ConstValue::Int(-1))
        );
        assert_eq!(
            ConstValue::Int(-7).modulo(&ConstValue::Int(3)),
            Some(ConstValue::Int(2))
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            ConstValue::Int(1).less_than(&ConstValue::Float(1.5)),
            Some(ConstValue::Bool(true))
        );
        assert_eq!(
            ConstValue::Int(2).less_equal(&ConstValue::Int(2)),
            Some(ConstValue::Bool(true))
        );
        assert_eq!(
            ConstValue::Str("a".into()).equals(&ConstValue::Int(1)),
            None
        );
        assert_eq!(ConstValue::Int(1).as_bool(), None);
    }

    #[test]
    fn test_runtime_type_is_concrete() {
        for value in [
            ConstValue::Int(1),
            ConstValue::Float(1.0),
            ConstValue::Bool(true),
            ConstValue::Str(String::new()),
            ConstValue::Nothing,
        ] {
            assert!(value.runtime_type().is_concrete());
        }
    }
}
