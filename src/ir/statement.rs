//! Statements of the linear function body.
//!
//! A function body is an ordered, 1-indexed sequence of [`Statement`]s. Every statement
//! implicitly defines the SSA value whose identifier is its own index; literals, global reads
//! and calls produce a value, control transfers do not.

use std::fmt;

use serde::Serialize;

use crate::ir::{ConstValue, Type};

/// 1-based position of a statement, which doubles as its SSA value identifier.
pub type StmtIndex = usize;

/// An input to a statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    /// SSA value defined by the statement at this index (`#n`).
    Value(StmtIndex),
    /// The function parameter at this 1-based position.
    Argument(usize),
    /// An immediate constant.
    Const(ConstValue),
}

impl Operand {
    /// Returns the referenced SSA value, if this operand is one.
    #[must_use]
    pub const fn as_value(&self) -> Option<StmtIndex> {
        match self {
            Self::Value(idx) => Some(*idx),
            _ => None,
        }
    }

    /// Returns `true` if this operand reads the given SSA value.
    #[must_use]
    pub fn is_value(&self, idx: StmtIndex) -> bool {
        self.as_value() == Some(idx)
    }
}

impl From<ConstValue> for Operand {
    fn from(value: ConstValue) -> Self {
        Self::Const(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(idx) => write!(f, "#{idx}"),
            Self::Argument(pos) => write!(f, "arg{pos}"),
            Self::Const(value) => write!(f, "{value}"),
        }
    }
}

/// One element of the function body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    /// A constant.
    Literal {
        /// The constant value
        value: ConstValue,
        /// Declared type
        ty: Type,
    },
    /// A read of a global binding.
    GlobalRead {
        /// Name of the global
        symbol: String,
        /// Declared type
        ty: Type,
        /// Whether the binding is a constant global
        is_immutable: bool,
    },
    /// A function call.
    Call {
        /// Callee symbol
        callee: String,
        /// Arguments; the first one is the dispatch receiver
        args: Vec<Operand>,
        /// Inferred result type
        result_type: Type,
    },
    /// Conditional branch: falls through when the condition equals `fallthrough_is_true`,
    /// otherwise jumps to `target`.
    ConditionalBranch {
        /// The branch condition
        condition: Operand,
        /// Condition value that selects the fallthrough arm
        fallthrough_is_true: bool,
        /// Jump target of the other arm
        target: StmtIndex,
    },
    /// Unconditional jump.
    UnconditionalJump {
        /// Jump target
        target: StmtIndex,
    },
    /// Function return.
    Return {
        /// Returned value, if any
        value: Option<Operand>,
    },
}

impl Statement {
    /// Returns `true` if this statement defines an SSA value.
    #[must_use]
    pub const fn produces_value(&self) -> bool {
        matches!(
            self,
            Self::Literal { .. } | Self::GlobalRead { .. } | Self::Call { .. }
        )
    }

    /// Returns `true` for branches, jumps and returns.
    #[must_use]
    pub const fn is_control_transfer(&self) -> bool {
        !self.produces_value()
    }

    /// Returns the declared type of the value this statement defines.
    #[must_use]
    pub const fn value_type(&self) -> Option<&Type> {
        match self {
            Self::Literal { ty, .. } | Self::GlobalRead { ty, .. } => Some(ty),
            Self::Call { result_type, .. } => Some(result_type),
            _ => None,
        }
    }

    /// Returns the jump target of a branch or jump.
    #[must_use]
    pub const fn jump_target(&self) -> Option<StmtIndex> {
        match self {
            Self::ConditionalBranch { target, .. } | Self::UnconditionalJump { target } => {
                Some(*target)
            }
            _ => None,
        }
    }

    /// Returns the callee symbol of a call.
    #[must_use]
    pub fn callee(&self) -> Option<&str> {
        match self {
            Self::Call { callee, .. } => Some(callee),
            _ => None,
        }
    }

    /// Returns all operands read by this statement, in order.
    #[must_use]
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Self::Call { args, .. } => args.iter().collect(),
            Self::ConditionalBranch { condition, .. } => vec![condition],
            Self::Return { value: Some(value) } => vec![value],
            Self::Literal { .. }
            | Self::GlobalRead { .. }
            | Self::UnconditionalJump { .. }
            | Self::Return { value: None } => Vec::new(),
        }
    }

    /// Returns `true` if any operand reads the given SSA value.
    #[must_use]
    pub fn uses_value(&self, idx: StmtIndex) -> bool {
        self.operands().iter().any(|op| op.is_value(idx))
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { value, ty } => write!(f, "{value}::{ty}"),
            Self::GlobalRead {
                symbol,
                ty,
                is_immutable,
            } => {
                let kind = if *is_immutable { "const " } else { "" };
                write!(f, "{kind}global {symbol}::{ty}")
            }
            Self::Call {
                callee,
                args,
                result_type,
            } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")::{result_type}")
            }
            Self::ConditionalBranch {
                condition,
                fallthrough_is_true,
                target,
            } => {
                let op = if *fallthrough_is_true { "goto_if_not" } else { "goto_if" };
                write!(f, "{op} {condition} -> #{target}")
            }
            Self::UnconditionalJump { target } => write!(f, "goto #{target}"),
            Self::Return { value: Some(value) } => write!(f, "return {value}"),
            Self::Return { value: None } => write!(f, "return"),
        }
    }
}
