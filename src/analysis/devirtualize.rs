//! Devirtualization analysis.
//!
//! Class-hierarchy style candidate resolution: for every call whose receiver (argument 1) has a
//! non-concrete declared type, the method table entry of the callee is filtered down to the
//! signatures whose receiver type may intersect the inferred one. The size of what remains
//! decides how the call could be dispatched without a dynamic lookup.
//!
//! | Candidates | Strategy |
//! |------------|----------|
//! | 1 | [`DispatchStrategy::Direct`] |
//! | 2 ..= `max_switch_targets` | [`DispatchStrategy::Switch`] |
//! | 0, or more | [`DispatchStrategy::None`] |
//!
//! A callee missing from the method table is reported as `None` with no candidates. Receivers
//! that constant propagation resolved are skipped: a constant's runtime type is concrete.

use std::collections::BTreeSet;

use log::{debug, trace};
use serde::Serialize;
use strum::Display;

use crate::{
    analysis::{constants::ConstantPropagation, AnalysisPass},
    config::{AnalyzerConfig, DEFAULT_DEAD_BRANCH_LOOKAHEAD, DEFAULT_MAX_SWITCH_TARGETS},
    context::AnalysisContext,
    ir::{Function, MethodSignature, Operand, Statement, StmtIndex, Type},
    Result,
};

/// How a virtual call site can be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DispatchStrategy {
    /// A single target: call it directly.
    Direct,
    /// A few targets: branch on the receiver's runtime type.
    Switch,
    /// Keep dynamic dispatch.
    None,
}

impl DispatchStrategy {
    /// Picks the strategy for a candidate count.
    #[must_use]
    pub const fn for_candidates(count: usize, max_switch_targets: usize) -> Self {
        match count {
            1 => Self::Direct,
            n if n >= 2 && n <= max_switch_targets => Self::Switch,
            _ => Self::None,
        }
    }
}

/// A call site dispatching on a non-concrete receiver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualCallSite {
    /// The call statement
    pub index: StmtIndex,
    /// Callee symbol
    pub callee: String,
    /// Inferred receiver type
    pub receiver_type: Type,
    /// Methods the call may reach, deduplicated and ordered
    pub candidate_targets: BTreeSet<MethodSignature>,
    /// Dispatch strategy
    pub strategy: DispatchStrategy,
    /// Whether the callee was found in the method table
    pub symbol_known: bool,
    /// The call sits inside a loop
    pub in_loop: bool,
}

impl VirtualCallSite {
    /// Returns `true` if the call keeps dynamic dispatch.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        self.strategy == DispatchStrategy::None
    }
}

/// Devirtualization pass.
#[derive(Debug, Clone, Copy)]
pub struct Devirtualization {
    max_switch_targets: usize,
    constants: ConstantPropagation,
}

impl Default for Devirtualization {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SWITCH_TARGETS, DEFAULT_DEAD_BRANCH_LOOKAHEAD)
    }
}

impl Devirtualization {
    /// Creates the pass with an explicit switch bound and constant-propagation lookahead.
    #[must_use]
    pub const fn new(max_switch_targets: usize, lookahead: usize) -> Self {
        Self {
            max_switch_targets,
            constants: ConstantPropagation::new(lookahead),
        }
    }

    /// Creates the pass from the engine configuration.
    #[must_use]
    pub const fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.max_switch_targets, config.dead_branch_lookahead)
    }

    fn candidates(
        ctx: &AnalysisContext,
        callee: &str,
        receiver: &Type,
    ) -> Option<BTreeSet<MethodSignature>> {
        let signatures = ctx.methods().lookup(callee)?;
        Some(
            signatures
                .iter()
                .filter(|sig| {
                    sig.receiver_type()
                        .is_some_and(|ty| ctx.hierarchy().intersects(ty, receiver))
                })
                .cloned()
                .collect(),
        )
    }
}

impl AnalysisPass for Devirtualization {
    type Output = Vec<VirtualCallSite>;

    fn name(&self) -> &'static str {
        "devirtualization"
    }

    fn run(&self, function: &Function, ctx: &AnalysisContext) -> Result<Self::Output> {
        let constants = self.constants.analyze(function, ctx);
        let loops = function.loop_regions();
        let mut sites = Vec::new();

        for (idx, stmt) in function.iter() {
            let Statement::Call { callee, args, .. } = stmt else {
                continue;
            };
            let Some(receiver) = args.first() else {
                continue;
            };
            if let Operand::Value(def) = receiver {
                if constants.is_constant(*def) {
                    continue;
                }
            }

            let receiver_type = function.operand_type(idx, receiver)?;
            if receiver_type.is_concrete() {
                continue;
            }

            let (candidate_targets, symbol_known) =
                match Self::candidates(ctx, callee, &receiver_type) {
                    Some(found) => (found, true),
                    None => (BTreeSet::new(), false),
                };
            let strategy =
                DispatchStrategy::for_candidates(candidate_targets.len(), self.max_switch_targets);
            let in_loop = loops.iter().any(|l| l.contains(idx));
            trace!(
                "#{idx}: {callee}({receiver_type}) -> {} candidates, {strategy}",
                candidate_targets.len()
            );

            sites.push(VirtualCallSite {
                index: idx,
                callee: callee.clone(),
                receiver_type,
                candidate_targets,
                strategy,
                symbol_known,
                in_loop,
            });
        }

        debug!(
            "{}: {} virtual call sites, {} unresolved",
            function.name,
            sites.len(),
            sites.iter().filter(|s| s.is_unresolved()).count()
        );
        Ok(sites)
    }

    fn description(&self) -> &'static str {
        "Resolves virtual call sites to a bounded target set"
    }
}
