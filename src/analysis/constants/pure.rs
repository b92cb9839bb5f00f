//! The closed allow-list of foldable operations.
//!
//! Folding never evaluates arbitrary code: a callee is folded only if it parses into a
//! [`PureOp`], and each op is evaluated with the checked [`ConstValue`] operations. Any failure
//! (wrong arity, mismatched operand kinds, overflow, domain error) means "not constant".

use strum::{Display, EnumIter, EnumString};

use crate::ir::ConstValue;

/// An operation on the pure-function allow-list, parsed from a callee name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum PureOp {
    /// `+`, n-ary
    #[strum(serialize = "+")]
    Add,
    /// `-`, binary subtraction or unary negation
    #[strum(serialize = "-")]
    Sub,
    /// `*`, n-ary
    #[strum(serialize = "*")]
    Mul,
    /// `/`, always produces a float
    #[strum(serialize = "/")]
    Div,
    /// Truncating integer division
    #[strum(to_string = "div", serialize = "÷")]
    IntDiv,
    /// Remainder, sign follows the dividend
    #[strum(to_string = "rem", serialize = "%")]
    Rem,
    /// Floored modulus, sign follows the divisor
    #[strum(serialize = "mod")]
    Mod,
    /// Exponentiation
    #[strum(serialize = "^")]
    Pow,
    /// Unary negation
    #[strum(serialize = "neg")]
    Neg,
    /// Equality
    #[strum(serialize = "==")]
    Eq,
    /// Inequality
    #[strum(serialize = "!=")]
    Ne,
    /// Less than
    #[strum(serialize = "<")]
    Lt,
    /// Less or equal
    #[strum(serialize = "<=")]
    Le,
    /// Greater than
    #[strum(serialize = ">")]
    Gt,
    /// Greater or equal
    #[strum(serialize = ">=")]
    Ge,
    /// Logical / bitwise not
    #[strum(serialize = "!")]
    Not,
    /// Logical / bitwise and
    #[strum(serialize = "&")]
    And,
    /// Logical / bitwise or
    #[strum(serialize = "|")]
    Or,
    /// Logical / bitwise xor
    #[strum(serialize = "xor")]
    Xor,
    /// Absolute value
    #[strum(serialize = "abs")]
    Abs,
    /// Minimum of two numbers
    #[strum(serialize = "min")]
    Min,
    /// Maximum of two numbers
    #[strum(serialize = "max")]
    Max,
    /// Square root
    #[strum(serialize = "sqrt")]
    Sqrt,
    /// Natural exponential
    #[strum(serialize = "exp")]
    Exp,
    /// Natural logarithm
    #[strum(serialize = "log")]
    Log,
    /// Sine
    #[strum(serialize = "sin")]
    Sin,
    /// Cosine
    #[strum(serialize = "cos")]
    Cos,
    /// Round toward negative infinity
    #[strum(serialize = "floor")]
    Floor,
    /// Round toward positive infinity
    #[strum(serialize = "ceil")]
    Ceil,
    /// Round half to even
    #[strum(serialize = "round")]
    Round,
}

impl PureOp {
    /// Parses a callee symbol, returning `None` for anything not on the allow-list.
    #[must_use]
    pub fn from_callee(callee: &str) -> Option<Self> {
        callee.parse().ok()
    }

    /// Evaluates the operation on constant arguments.
    ///
    /// Returns `None` whenever the result is not a well-defined constant.
    #[must_use]
    pub fn evaluate(self, args: &[ConstValue]) -> Option<ConstValue> {
        match (self, args) {
            (Self::Add, [first, rest @ ..]) if first.is_numeric() => {
                rest.iter().try_fold(first.clone(), |acc, x| acc.add(x))
            }
            (Self::Mul, [first, rest @ ..]) if first.is_numeric() => {
                rest.iter().try_fold(first.clone(), |acc, x| acc.mul(x))
            }
            (Self::Sub | Self::Neg, [x]) => x.negate(),
            (Self::Sub, [a, b]) => a.sub(b),
            (Self::Div, [a, b]) => a.div(b),
            (Self::IntDiv, [a, b]) => a.int_div(b),
            (Self::Rem, [a, b]) => a.rem(b),
            (Self::Mod, [a, b]) => a.modulo(b),
            (Self::Pow, [a, b]) => a.pow(b),
            (Self::Eq, [a, b]) => a.equals(b),
            (Self::Ne, [a, b]) => a.equals(b)?.not(),
            (Self::Lt, [a, b]) => a.less_than(b),
            (Self::Le, [a, b]) => a.less_equal(b),
            (Self::Gt, [a, b]) => b.less_than(a),
            (Self::Ge, [a, b]) => b.less_equal(a),
            (Self::Not, [x]) => x.not(),
            (Self::And, [a, b]) => a.and(b),
            (Self::Or, [a, b]) => a.or(b),
            (Self::Xor, [a, b]) => a.xor(b),
            (Self::Abs, [ConstValue::Int(v)]) => v.checked_abs().map(ConstValue::Int),
            (Self::Abs, [x]) => x.map_float(f64::abs),
            (Self::Min, [a, b]) => {
                let a_first = a.less_equal(b)?.as_bool()?;
                promote_mixed(a, b, if a_first { a } else { b })
            }
            (Self::Max, [a, b]) => {
                let b_first = a.less_than(b)?.as_bool()?;
                promote_mixed(a, b, if b_first { b } else { a })
            }
            (Self::Sqrt, [x]) => x.map_float(f64::sqrt),
            (Self::Exp, [x]) => x.map_float(f64::exp),
            (Self::Log, [x]) => x.map_float(f64::ln),
            (Self::Sin, [x]) => x.map_float(f64::sin),
            (Self::Cos, [x]) => x.map_float(f64::cos),
            (Self::Floor | Self::Ceil | Self::Round, [ConstValue::Int(v)]) => {
                Some(ConstValue::Int(*v))
            }
            (Self::Floor, [x @ ConstValue::Float(_)]) => x.map_float(f64::floor),
            (Self::Ceil, [x @ ConstValue::Float(_)]) => x.map_float(f64::ceil),
            (Self::Round, [x @ ConstValue::Float(_)]) => x.map_float(f64::round_ties_even),
            _ => None,
        }
    }
}

/// Returns `chosen` as a float when either operand is one.
fn promote_mixed(a: &ConstValue, b: &ConstValue, chosen: &ConstValue) -> Option<ConstValue> {
    if matches!(a, ConstValue::Float(_)) || matches!(b, ConstValue::Float(_)) {
        chosen.as_float().map(ConstValue::Float)
    } else {
        Some(chosen.clone())
    }
}
