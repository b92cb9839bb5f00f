//! Fluent construction of [`Function`] bodies.
//!
//! The builder appends statements in order and hands back the handle of each one, so a body
//! reads top to bottom the way the frontend would emit it:
//!
//! ```rust
//! use optscope::{ConstValue, FunctionBuilder, Operand, Type};
//!
//! let mut b = FunctionBuilder::new("total");
//! let arr = b.call(
//!     "zeros",
//!     vec![Operand::Const(ConstValue::Int(10))],
//!     Type::container("Vector", vec![Type::float()]),
//! );
//! let sum = b.call("sum", vec![arr], Type::float());
//! b.ret(Some(sum));
//!
//! let function = b.build()?;
//! assert_eq!(function.len(), 3);
//! # Ok::<(), optscope::Error>(())
//! ```
//!
//! Forward branch targets are usually unknown when the branch is emitted; emit it with a
//! placeholder and fix it up with [`FunctionBuilder::patch_target`].

use crate::{
    ir::{ConstValue, Function, Operand, Statement, StmtIndex, Type},
    Result,
};

/// Incremental builder for a [`Function`].
#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    name: String,
    parameter_types: Vec<Type>,
    statements: Vec<Statement>,
}

impl FunctionBuilder {
    /// Creates a builder for a function with no parameters and an empty body.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter_types: Vec::new(),
            statements: Vec::new(),
        }
    }

    /// Declares the next parameter and returns an operand reading it.
    pub fn param(&mut self, ty: Type) -> Operand {
        self.parameter_types.push(ty);
        Operand::Argument(self.parameter_types.len())
    }

    /// Returns the index the next appended statement will get.
    #[must_use]
    pub fn next_index(&self) -> StmtIndex {
        self.statements.len() + 1
    }

    /// Appends an arbitrary statement and returns its index.
    pub fn push(&mut self, statement: Statement) -> StmtIndex {
        self.statements.push(statement);
        self.statements.len()
    }

    /// Appends a literal with an explicit type.
    pub fn literal(&mut self, value: ConstValue, ty: Type) -> Operand {
        Operand::Value(self.push(Statement::Literal { value, ty }))
    }

    /// Appends an `Int64` literal.
    pub fn int(&mut self, value: i64) -> Operand {
        self.literal(ConstValue::Int(value), Type::int())
    }

    /// Appends a `Float64` literal.
    pub fn float(&mut self, value: f64) -> Operand {
        self.literal(ConstValue::Float(value), Type::float())
    }

    /// Appends a `Bool` literal.
    pub fn bool(&mut self, value: bool) -> Operand {
        self.literal(ConstValue::Bool(value), Type::bool())
    }

    /// Appends a global read.
    pub fn global(&mut self, symbol: impl Into<String>, ty: Type, is_immutable: bool) -> Operand {
        Operand::Value(self.push(Statement::GlobalRead {
            symbol: symbol.into(),
            ty,
            is_immutable,
        }))
    }

    /// Appends a call.
    pub fn call(&mut self, callee: impl Into<String>, args: Vec<Operand>, result_type: Type) -> Operand {
        Operand::Value(self.push(Statement::Call {
            callee: callee.into(),
            args,
            result_type,
        }))
    }

    /// Appends a conditional branch.
    pub fn branch(
        &mut self,
        condition: Operand,
        fallthrough_is_true: bool,
        target: StmtIndex,
    ) -> StmtIndex {
        self.push(Statement::ConditionalBranch {
            condition,
            fallthrough_is_true,
            target,
        })
    }

    /// Appends an unconditional jump.
    pub fn jump(&mut self, target: StmtIndex) -> StmtIndex {
        self.push(Statement::UnconditionalJump { target })
    }

    /// Appends a return.
    pub fn ret(&mut self, value: Option<Operand>) -> StmtIndex {
        self.push(Statement::Return { value })
    }

    /// Rewrites the target of an already emitted branch or jump.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `at` is not a branch or jump.
    pub fn patch_target(&mut self, at: StmtIndex, new_target: StmtIndex) -> Result<()> {
        match at.checked_sub(1).and_then(|i| self.statements.get_mut(i)) {
            Some(
                Statement::ConditionalBranch { target, .. }
                | Statement::UnconditionalJump { target },
            ) => {
                *target = new_target;
                Ok(())
            }
            _ => Err(malformed_error!("#{} is not a branch or jump", at)),
        }
    }

    /// Finishes the function and validates it.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation, see [`Function::validate`].
    pub fn build(self) -> Result<Function> {
        let function = Function::new(self.name, self.parameter_types, self.statements);
        function.validate()?;
        Ok(function)
    }
}
