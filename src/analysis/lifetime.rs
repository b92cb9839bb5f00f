//! Lifetime analysis for manually managed allocations.
//!
//! For each `manual` allocation site the pass finds the last use of the allocated value and
//! looks for a point where a release could be inserted automatically. The allocation is only
//! auto-freeable when nothing can observe it afterwards:
//!
//! - returned, stored to a global or passed to an unknown callee: capture conflict
//! - already passed to a release function: conflict, a second release would be a double free
//!
//! # Insertion Point
//!
//! `free_insertion_index` names the statement the release is inserted *before*. It is the first
//! statement after the last use, up to and including the nearest following `Return`, that is
//!
//! - not a join point (jump or branch target), unless every branch targeting it was proven by
//!   constant propagation to never take its jump, and
//! - not inside a loop that does not also contain the allocation, and
//! - not reachable through a jump that skips the allocation.

use log::{debug, trace};
use serde::Serialize;

use crate::{
    analysis::{
        allocation::allocation_sites,
        constants::{ConstantPropagation, ConstantResults},
        uses::{forward_uses, UseKind},
        AnalysisPass,
    },
    config::{AnalyzerConfig, DEFAULT_DEAD_BRANCH_LOOKAHEAD},
    context::{AllocationKind, AnalysisContext},
    ir::{Function, LoopRegion, Statement, StmtIndex},
    utils::StatementSet,
    Result,
};

/// Release plan for one manual allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationLifetime {
    /// The allocating statement
    pub index: StmtIndex,
    /// The allocating callee
    pub callee: String,
    /// Last statement reading the value (the allocation itself if never read)
    pub last_use_index: StmtIndex,
    /// Reasons the release cannot be automated, in statement order
    pub conflicts: Vec<String>,
    /// Insert the release immediately before this statement
    pub free_insertion_index: Option<StmtIndex>,
    /// A release can be inserted automatically
    pub can_auto_free: bool,
}

/// Lifetime analysis pass.
#[derive(Debug, Clone, Copy)]
pub struct LifetimeAnalysis {
    constants: ConstantPropagation,
}

impl Default for LifetimeAnalysis {
    fn default() -> Self {
        Self::new(DEFAULT_DEAD_BRANCH_LOOKAHEAD)
    }
}

impl LifetimeAnalysis {
    /// Creates the pass with an explicit constant-propagation lookahead.
    #[must_use]
    pub const fn new(lookahead: usize) -> Self {
        Self {
            constants: ConstantPropagation::new(lookahead),
        }
    }

    /// Creates the pass from the engine configuration.
    #[must_use]
    pub const fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.dead_branch_lookahead)
    }
}

impl AnalysisPass for LifetimeAnalysis {
    type Output = Vec<AllocationLifetime>;

    fn name(&self) -> &'static str {
        "lifetime"
    }

    fn run(&self, function: &Function, ctx: &AnalysisContext) -> Result<Self::Output> {
        let sites: Vec<_> = allocation_sites(function, ctx)
            .into_iter()
            .filter(|site| site.kind == AllocationKind::Manual)
            .collect();
        if sites.is_empty() {
            return Ok(Vec::new());
        }

        let constants = self.constants.analyze(function, ctx);
        let jumps = live_jumps(function, &constants);
        let mut joins = StatementSet::new(function.len());
        for &(_, target) in &jumps {
            joins.insert(target);
        }
        let loops = function.loop_regions();

        let lifetimes: Vec<AllocationLifetime> = sites
            .into_iter()
            .map(|site| {
                let uses = forward_uses(function, ctx, site.index);
                let last_use_index = uses.last().map_or(site.index, |u| u.index);
                let conflicts: Vec<String> = uses
                    .iter()
                    .filter(|u| u.kind.is_capture() || u.kind == UseKind::Release)
                    .map(|u| match &u.kind {
                        UseKind::UnknownCall(callee) => {
                            format!("captured by unknown callee '{callee}' at #{}", u.index)
                        }
                        _ => u.to_string(),
                    })
                    .collect();

                let free_insertion_index = if conflicts.is_empty() {
                    insertion_point(function, &jumps, &joins, &loops, site.index, last_use_index)
                } else {
                    None
                };
                let can_auto_free = free_insertion_index.is_some();
                trace!(
                    "#{} {}: last use #{last_use_index}, free before {free_insertion_index:?}",
                    site.index,
                    site.callee
                );

                AllocationLifetime {
                    index: site.index,
                    callee: site.callee,
                    last_use_index,
                    conflicts,
                    free_insertion_index,
                    can_auto_free,
                }
            })
            .collect();

        debug!(
            "{}: {} manual allocations, {} auto-freeable",
            function.name,
            lifetimes.len(),
            lifetimes.iter().filter(|l| l.can_auto_free).count()
        );
        Ok(lifetimes)
    }

    fn description(&self) -> &'static str {
        "Computes safe auto-release points for manually managed allocations"
    }
}

/// Jumps still taken after constant propagation, as `(source, target)` pairs.
fn live_jumps(function: &Function, constants: &ConstantResults) -> Vec<(StmtIndex, StmtIndex)> {
    function
        .iter()
        .filter_map(|(idx, stmt)| {
            let target = stmt.jump_target()?;
            let jump_is_dead = matches!(stmt, Statement::ConditionalBranch { .. })
                && constants.dead_branch(idx).is_some_and(|r| r.jump_is_dead);
            (!jump_is_dead).then_some((idx, target))
        })
        .collect()
}

/// First position after `last_use` reached only through the allocation.
///
/// A jump from outside `allocation..idx` into `allocation + 1..=idx` would reach the release
/// without running the allocation, so such positions are rejected as well.
fn insertion_point(
    function: &Function,
    jumps: &[(StmtIndex, StmtIndex)],
    joins: &StatementSet,
    loops: &[LoopRegion],
    allocation: StmtIndex,
    last_use: StmtIndex,
) -> Option<StmtIndex> {
    let ret = function.next_return(last_use)?;
    (last_use + 1..=ret).find(|&idx| {
        let bypassed = jumps.iter().any(|&(from, to)| {
            to > allocation && to <= idx && !(from > allocation && from < idx)
        });
        !joins.contains(idx)
            && !bypassed
            && loops
                .iter()
                .all(|l| !l.contains(idx) || l.contains(allocation))
    })
}
