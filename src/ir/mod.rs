//! Typed, linear SSA intermediate representation.
//!
//! This is the shared data model consumed by every analysis. A [`Function`] is an ordered,
//! 1-indexed sequence of [`Statement`]s; each statement implicitly defines the SSA value with
//! its own index, and operands refer back to those values as [`Operand::Value`].
//!
//! # Key Types
//!
//! - [`Function`] - name, parameter types and body of one specialization
//! - [`Statement`] - literal, global read, call, branch, jump or return
//! - [`Operand`] - SSA value, parameter or immediate constant
//! - [`Type`] - declared type annotation (concrete, abstract, union, container, top)
//! - [`TypeHierarchy`] - nominal subtype relation used for dispatch questions
//! - [`ConstValue`] - constant values with checked folding operations
//! - [`FunctionBuilder`] - fluent construction with validation
//!
//! # Invariants
//!
//! Once [`Function::validate`] has passed, every `Operand::Value` points at a value-producing
//! statement inside the body, every parameter operand is declared, and every jump target is in
//! range. Passes rely on this and treat any remaining inconsistency as an internal failure.

mod builder;
mod function;
mod hierarchy;
mod statement;
mod types;
mod value;

pub use builder::FunctionBuilder;
pub use function::{Function, LoopRegion, MethodSignature};
pub use hierarchy::TypeHierarchy;
pub use statement::{Operand, Statement, StmtIndex};
pub use types::Type;
pub use value::ConstValue;
