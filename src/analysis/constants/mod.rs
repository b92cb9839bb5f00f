//! Constant propagation and dead-branch detection.
//!
//! A single forward sweep over the body assigns every SSA value a [`ScalarValue`]:
//!
//! - **Literal**: constant
//! - **Immutable global read**: constant, with a value if the context knows the binding
//! - **Call to a [`PureOp`]** whose arguments are all constants: evaluated eagerly
//! - **Everything else**: not constant
//!
//! Operands that refer forward (to a value defined later, which only happens around loops) are
//! still unvisited at their use and therefore never constant.
//!
//! # Dead Branches
//!
//! A conditional branch whose condition resolves to a literal boolean has one dead arm. The
//! number of statements attributed to it is counted forward from the branch up to the next
//! control transfer or join point, capped by the configured lookahead. The count may fall
//! short of the real arm size but never exceeds it.

mod pure;

pub use pure::PureOp;

use log::{debug, trace};
use serde::Serialize;

use crate::{
    analysis::AnalysisPass,
    config::{AnalyzerConfig, DEFAULT_DEAD_BRANCH_LOOKAHEAD},
    context::AnalysisContext,
    ir::{ConstValue, Function, Operand, Statement, StmtIndex},
    utils::StatementSet,
    Result,
};

/// Lattice value of one SSA value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScalarValue {
    /// Not visited yet.
    #[default]
    Top,
    /// Known constant value.
    Constant(ConstValue),
    /// A constant whose value is not known (immutable global without a supplied value).
    Opaque,
    /// Not a constant.
    Bottom,
}

impl ScalarValue {
    /// Returns the constant value if this is a known constant.
    #[must_use]
    pub const fn as_constant(&self) -> Option<&ConstValue> {
        match self {
            Self::Constant(c) => Some(c),
            _ => None,
        }
    }

    /// Returns `true` for known and opaque constants.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_) | Self::Opaque)
    }
}

/// A value proven constant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantRecord {
    /// The defining statement
    pub index: StmtIndex,
    /// The value, when known
    pub value: Option<ConstValue>,
    /// The value comes from an immutable global binding
    pub is_global_immutable: bool,
    /// The value was computed by folding a pure call
    pub folded: bool,
}

/// A branch whose condition is statically known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadBranchRecord {
    /// The conditional branch
    pub index: StmtIndex,
    /// Condition value of the arm that can never run
    pub eliminated_arm: bool,
    /// Statements attributed to the dead arm (bounded lookahead)
    pub statements_eliminated: usize,
    /// Whether the never-taken arm is the jump (rather than the fallthrough)
    pub jump_is_dead: bool,
    /// Jump target of the branch
    pub target: StmtIndex,
}

/// Result of constant propagation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantResults {
    /// Constant values, in statement order
    pub records: Vec<ConstantRecord>,
    /// Statically decided branches, in statement order
    pub dead_branches: Vec<DeadBranchRecord>,
    /// Number of pure calls folded into constants
    pub foldable_count: usize,
    #[serde(skip)]
    values: Vec<ScalarValue>,
}

impl ConstantResults {
    /// Returns the lattice value of an SSA value.
    #[must_use]
    pub fn value(&self, idx: StmtIndex) -> Option<&ScalarValue> {
        idx.checked_sub(1).and_then(|i| self.values.get(i))
    }

    /// Returns the constant value of an SSA value if known.
    #[must_use]
    pub fn constant_value(&self, idx: StmtIndex) -> Option<&ConstValue> {
        self.value(idx).and_then(ScalarValue::as_constant)
    }

    /// Returns `true` if the SSA value is a constant, known or opaque.
    #[must_use]
    pub fn is_constant(&self, idx: StmtIndex) -> bool {
        self.value(idx).is_some_and(ScalarValue::is_constant)
    }

    /// Returns the dead-branch record of a branch, if it was decided.
    #[must_use]
    pub fn dead_branch(&self, idx: StmtIndex) -> Option<&DeadBranchRecord> {
        self.dead_branches.iter().find(|r| r.index == idx)
    }

    /// Returns the total number of statements attributed to dead arms.
    #[must_use]
    pub fn dead_statements(&self) -> usize {
        self.dead_branches.iter().map(|r| r.statements_eliminated).sum()
    }

    /// Returns `true` if nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.dead_branches.is_empty()
    }
}

/// Constant propagation pass.
#[derive(Debug, Clone, Copy)]
pub struct ConstantPropagation {
    lookahead: usize,
}

impl Default for ConstantPropagation {
    fn default() -> Self {
        Self::new(DEFAULT_DEAD_BRANCH_LOOKAHEAD)
    }
}

impl ConstantPropagation {
    /// Creates the pass with an explicit dead-branch lookahead.
    #[must_use]
    pub const fn new(lookahead: usize) -> Self {
        Self { lookahead }
    }

    /// Creates the pass from the engine configuration.
    #[must_use]
    pub const fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.dead_branch_lookahead)
    }

    /// Runs the sweep. Infallible; [`AnalysisPass::run`] only wraps it.
    #[must_use]
    pub fn analyze(&self, function: &Function, ctx: &AnalysisContext) -> ConstantResults {
        let mut values = vec![ScalarValue::Top; function.len()];
        let mut records = Vec::new();
        let mut dead_branches = Vec::new();
        let mut foldable_count = 0;

        let join_points: StatementSet = {
            let mut set = StatementSet::new(function.len());
            for (_, stmt) in function.iter() {
                if let Some(target) = stmt.jump_target() {
                    set.insert(target);
                }
            }
            set
        };

        for (idx, stmt) in function.iter() {
            let value = match stmt {
                Statement::Literal { value, .. } => {
                    records.push(ConstantRecord {
                        index: idx,
                        value: Some(value.clone()),
                        is_global_immutable: false,
                        folded: false,
                    });
                    ScalarValue::Constant(value.clone())
                }
                Statement::GlobalRead {
                    symbol,
                    is_immutable: true,
                    ..
                } => {
                    let known = ctx.global_constant(symbol).cloned();
                    records.push(ConstantRecord {
                        index: idx,
                        value: known.clone(),
                        is_global_immutable: true,
                        folded: false,
                    });
                    known.map_or(ScalarValue::Opaque, ScalarValue::Constant)
                }
                Statement::Call { callee, args, .. } => {
                    match fold_call(callee, args, &values) {
                        Some(folded) => {
                            trace!("#{idx}: folded {callee} to {folded}");
                            foldable_count += 1;
                            records.push(ConstantRecord {
                                index: idx,
                                value: Some(folded.clone()),
                                is_global_immutable: false,
                                folded: true,
                            });
                            ScalarValue::Constant(folded)
                        }
                        None => ScalarValue::Bottom,
                    }
                }
                Statement::ConditionalBranch {
                    condition,
                    fallthrough_is_true,
                    target,
                } => {
                    if let Some(resolved) =
                        resolve(condition, &values).and_then(ConstValue::as_bool)
                    {
                        let statements_eliminated =
                            self.count_dead(function, idx, &join_points);
                        trace!("#{idx}: condition is always {resolved}");
                        dead_branches.push(DeadBranchRecord {
                            index: idx,
                            eliminated_arm: !resolved,
                            statements_eliminated,
                            jump_is_dead: resolved == *fallthrough_is_true,
                            target: *target,
                        });
                    }
                    ScalarValue::Bottom
                }
                Statement::GlobalRead { .. }
                | Statement::UnconditionalJump { .. }
                | Statement::Return { .. } => ScalarValue::Bottom,
            };
            values[idx - 1] = value;
        }

        debug!(
            "{}: {} constants ({} folded), {} dead branches",
            function.name,
            records.len(),
            foldable_count,
            dead_branches.len()
        );

        ConstantResults {
            records,
            dead_branches,
            foldable_count,
            values,
        }
    }

    /// Counts statements after a decided branch up to the next control transfer or join point.
    fn count_dead(&self, function: &Function, branch: StmtIndex, joins: &StatementSet) -> usize {
        function
            .iter_after(branch)
            .take(self.lookahead)
            .take_while(|(idx, stmt)| !stmt.is_control_transfer() && !joins.contains(*idx))
            .count()
    }
}

impl AnalysisPass for ConstantPropagation {
    type Output = ConstantResults;

    fn name(&self) -> &'static str {
        "constants"
    }

    fn run(&self, function: &Function, ctx: &AnalysisContext) -> Result<Self::Output> {
        Ok(self.analyze(function, ctx))
    }

    fn description(&self) -> &'static str {
        "Folds constant expressions and flags statically decided branches"
    }
}

/// Resolves an operand to a known constant.
fn resolve<'a>(operand: &'a Operand, values: &'a [ScalarValue]) -> Option<&'a ConstValue> {
    match operand {
        Operand::Const(value) => Some(value),
        Operand::Value(idx) => idx
            .checked_sub(1)
            .and_then(|i| values.get(i))
            .and_then(ScalarValue::as_constant),
        Operand::Argument(_) => None,
    }
}

/// Folds a call if its callee is pure and every argument is a known constant.
fn fold_call(callee: &str, args: &[Operand], values: &[ScalarValue]) -> Option<ConstValue> {
    let op = PureOp::from_callee(callee)?;
    let args = args
        .iter()
        .map(|arg| resolve(arg, values).cloned())
        .collect::<Option<Vec<_>>>()?;
    op.evaluate(&args)
}
