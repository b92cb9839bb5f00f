//! Forward use classification for allocated values.
//!
//! Escape and lifetime analysis ask the same question about an allocation: what does every
//! later statement do with its SSA value? The answer depends only on the statement kind and
//! the callee's allow-list membership, so it is computed once here.

use std::fmt;

use crate::{
    context::AnalysisContext,
    ir::{Function, Operand, Statement, StmtIndex},
};

/// What a statement does with a value it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseKind {
    /// The value is returned.
    Return,
    /// The value is stored into global storage.
    GlobalStore,
    /// The value is passed to a callee that may retain it.
    UnknownCall(String),
    /// The value is only read by an accessor that never retains it.
    SafeRead,
    /// The value is explicitly released.
    Release,
    /// The value decides a branch.
    Condition,
}

impl UseKind {
    /// Returns `true` if the value may outlive the function through this use.
    #[must_use]
    pub const fn is_capture(&self) -> bool {
        matches!(self, Self::Return | Self::GlobalStore | Self::UnknownCall(_))
    }
}

/// One use of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueUse {
    /// The using statement
    pub index: StmtIndex,
    /// What the statement does with the value
    pub kind: UseKind,
}

impl fmt::Display for ValueUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.index;
        match &self.kind {
            UseKind::Return => write!(f, "returned at #{at}"),
            UseKind::GlobalStore => write!(f, "stored to global storage at #{at}"),
            UseKind::UnknownCall(callee) => write!(f, "passed to unknown callee '{callee}' at #{at}"),
            UseKind::SafeRead => write!(f, "read at #{at}"),
            UseKind::Release => write!(f, "already released at #{at}"),
            UseKind::Condition => write!(f, "used as a condition at #{at}"),
        }
    }
}

/// Collects every use of `value` after its definition, in statement order.
#[must_use]
pub fn forward_uses(function: &Function, ctx: &AnalysisContext, value: StmtIndex) -> Vec<ValueUse> {
    function
        .iter_after(value)
        .filter(|(_, stmt)| stmt.uses_value(value))
        .map(|(index, stmt)| ValueUse {
            index,
            kind: classify(function, ctx, stmt),
        })
        .collect()
}

fn classify(function: &Function, ctx: &AnalysisContext, stmt: &Statement) -> UseKind {
    match stmt {
        Statement::Return { .. } => UseKind::Return,
        Statement::ConditionalBranch { .. } => UseKind::Condition,
        Statement::Call { callee, args, .. } => {
            if ctx.is_release(callee) {
                UseKind::Release
            } else if ctx.is_global_store(callee) {
                UseKind::GlobalStore
            } else if ctx.is_safe_read(callee) {
                UseKind::SafeRead
            } else if args.iter().any(|arg| reads_global(function, arg)) {
                // e.g. setindex!(cache, value, key) where `cache` is a global binding
                UseKind::GlobalStore
            } else {
                UseKind::UnknownCall(callee.clone())
            }
        }
        Statement::Literal { .. }
        | Statement::GlobalRead { .. }
        | Statement::UnconditionalJump { .. } => UseKind::SafeRead,
    }
}

fn reads_global(function: &Function, operand: &Operand) -> bool {
    operand
        .as_value()
        .and_then(|idx| function.statement(idx))
        .is_some_and(|stmt| matches!(stmt, Statement::GlobalRead { .. }))
}
