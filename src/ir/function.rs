//! Function descriptors handed over by the frontend.
//!
//! A [`Function`] is one (function, argument-type signature) pair after type inference: a name,
//! the declared parameter types, and the statement sequence. [`Function::validate`] checks the
//! structural invariants once at ingestion; every pass may assume them afterwards.

use std::fmt;

use serde::Serialize;

use crate::{
    ir::{Operand, Statement, StmtIndex, Type},
    Error, Result,
};

/// A callable signature: the unit stored in a method table.
///
/// Parameter 1 is the dispatch receiver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Declared parameter types
    pub parameter_types: Vec<Type>,
}

impl MethodSignature {
    /// Creates a new signature.
    #[must_use]
    pub fn new(name: impl Into<String>, parameter_types: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            parameter_types,
        }
    }

    /// Returns the receiver type, i.e. the first parameter type.
    #[must_use]
    pub fn receiver_type(&self) -> Option<&Type> {
        self.parameter_types.first()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, ty) in self.parameter_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "::{ty}")?;
        }
        write!(f, ")")
    }
}

/// A loop body spanning `header..=latch`, closed by a backward branch or jump at `latch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopRegion {
    /// First statement of the loop (the backward target)
    pub header: StmtIndex,
    /// The branch or jump that closes the loop
    pub latch: StmtIndex,
}

impl LoopRegion {
    /// Returns `true` if the statement lies within the loop body.
    #[must_use]
    pub const fn contains(&self, idx: StmtIndex) -> bool {
        idx >= self.header && idx <= self.latch
    }
}

/// A typed function body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Declared parameter types
    pub parameter_types: Vec<Type>,
    /// The body, stored 0-based but addressed 1-based
    pub statements: Vec<Statement>,
}

impl Function {
    /// Creates a function without validating it.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        parameter_types: Vec<Type>,
        statements: Vec<Statement>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_types,
            statements,
        }
    }

    /// Returns the number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns `true` if the body has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Returns the statement at a 1-based index.
    #[must_use]
    pub fn statement(&self, idx: StmtIndex) -> Option<&Statement> {
        idx.checked_sub(1).and_then(|i| self.statements.get(i))
    }

    /// Iterates over `(index, statement)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (StmtIndex, &Statement)> + '_ {
        self.statements.iter().enumerate().map(|(i, s)| (i + 1, s))
    }

    /// Iterates over the statements strictly after `idx`.
    pub fn iter_after(&self, idx: StmtIndex) -> impl Iterator<Item = (StmtIndex, &Statement)> + '_ {
        self.iter().skip(idx)
    }

    /// Returns this function's own signature.
    #[must_use]
    pub fn signature(&self) -> MethodSignature {
        MethodSignature::new(self.name.clone(), self.parameter_types.clone())
    }

    /// Returns the declared type of an operand.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DanglingReference`] or [`Error::InvalidArgument`] if the operand does
    /// not resolve, and [`Error::NotAValue`] if it names a control transfer.
    pub fn operand_type(&self, at: StmtIndex, operand: &Operand) -> Result<Type> {
        match operand {
            Operand::Value(idx) => {
                let stmt = self.statement(*idx).ok_or(Error::DanglingReference {
                    statement: at,
                    reference: *idx,
                })?;
                stmt.value_type().cloned().ok_or(Error::NotAValue {
                    statement: at,
                    reference: *idx,
                })
            }
            Operand::Argument(pos) => pos
                .checked_sub(1)
                .and_then(|p| self.parameter_types.get(p))
                .cloned()
                .ok_or(Error::InvalidArgument {
                    statement: at,
                    position: *pos,
                    count: self.parameter_types.len(),
                }),
            Operand::Const(value) => Ok(value.runtime_type()),
        }
    }

    /// Returns the loops formed by backward branches and jumps, in statement order.
    #[must_use]
    pub fn loop_regions(&self) -> Vec<LoopRegion> {
        self.iter()
            .filter_map(|(idx, stmt)| {
                stmt.jump_target()
                    .filter(|&target| target <= idx)
                    .map(|header| LoopRegion { header, latch: idx })
            })
            .collect()
    }

    /// Returns the index of the first `Return` strictly after `idx`.
    #[must_use]
    pub fn next_return(&self, idx: StmtIndex) -> Option<StmtIndex> {
        self.iter_after(idx)
            .find(|(_, stmt)| matches!(stmt, Statement::Return { .. }))
            .map(|(i, _)| i)
    }

    /// Checks the structural invariants the frontend is expected to uphold.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, scanning in statement order:
    /// [`Error::Empty`], [`Error::DanglingReference`], [`Error::NotAValue`],
    /// [`Error::InvalidArgument`] or [`Error::InvalidJumpTarget`].
    pub fn validate(&self) -> Result<()> {
        if self.statements.is_empty() {
            return Err(Error::Empty(self.name.clone()));
        }

        let len = self.len();
        for (idx, stmt) in self.iter() {
            for operand in stmt.operands() {
                match operand {
                    Operand::Value(reference) => {
                        if *reference == 0 || *reference > len || *reference == idx {
                            return Err(Error::DanglingReference {
                                statement: idx,
                                reference: *reference,
                            });
                        }
                        if !self.statements[*reference - 1].produces_value() {
                            return Err(Error::NotAValue {
                                statement: idx,
                                reference: *reference,
                            });
                        }
                    }
                    Operand::Argument(_) => {
                        self.operand_type(idx, operand)?;
                    }
                    Operand::Const(_) => {}
                }
            }

            if let Some(target) = stmt.jump_target() {
                if target == 0 || target > len {
                    return Err(Error::InvalidJumpTarget {
                        statement: idx,
                        target,
                    });
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.signature())?;
        for (idx, stmt) in self.iter() {
            writeln!(f, "  #{idx} = {stmt}")?;
        }
        Ok(())
    }
}
