//! Escape analysis.
//!
//! For every allocation site, decides whether the allocated value can outlive the function and,
//! if not, whether it is small enough to live on the stack or be split into scalars.
//!
//! # Rules
//!
//! A later use makes the allocation escape when the value is
//!
//! - returned,
//! - stored into global storage (a global-store callee, or a call that also receives an
//!   operand read from a global), or
//! - passed to any callee that is not a known safe reader or release function.
//!
//! Promotion needs a non-escaping allocation of known size below the configured threshold;
//! scalar replacement additionally requires an array below the (smaller) scalar threshold. An
//! unknown size never promotes.

use log::{debug, trace};
use serde::Serialize;

use crate::{
    analysis::{allocation::allocation_sites, uses::forward_uses, AnalysisPass},
    config::{AnalyzerConfig, DEFAULT_SCALAR_THRESHOLD, DEFAULT_STACK_THRESHOLD},
    context::{AllocationKind, AnalysisContext},
    ir::{Function, StmtIndex},
    Result,
};

/// Escape verdict for one allocation site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscapeRecord {
    /// The allocating statement
    pub index: StmtIndex,
    /// The allocating callee
    pub callee: String,
    /// Memory kind produced
    pub kind: AllocationKind,
    /// Whether the size is known
    pub size_known: bool,
    /// Estimated size in bytes
    pub estimated_bytes: Option<u64>,
    /// Whether the value may outlive the function
    pub escapes: bool,
    /// Why the value escapes, in statement order
    pub reasons: Vec<String>,
    /// The allocation can be moved to the stack
    pub can_stack_promote: bool,
    /// The array can be replaced by scalars
    pub can_scalar_replace: bool,
}

/// Escape analysis pass.
#[derive(Debug, Clone, Copy)]
pub struct EscapeAnalysis {
    stack_threshold: u64,
    scalar_threshold: u64,
}

impl Default for EscapeAnalysis {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_THRESHOLD, DEFAULT_SCALAR_THRESHOLD)
    }
}

impl EscapeAnalysis {
    /// Creates the pass with explicit byte thresholds.
    #[must_use]
    pub const fn new(stack_threshold: u64, scalar_threshold: u64) -> Self {
        Self {
            stack_threshold,
            scalar_threshold,
        }
    }

    /// Creates the pass from the engine configuration.
    #[must_use]
    pub const fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.stack_threshold, config.scalar_threshold)
    }
}

impl AnalysisPass for EscapeAnalysis {
    type Output = Vec<EscapeRecord>;

    fn name(&self) -> &'static str {
        "escape"
    }

    fn run(&self, function: &Function, ctx: &AnalysisContext) -> Result<Self::Output> {
        let records: Vec<EscapeRecord> = allocation_sites(function, ctx)
            .into_iter()
            .map(|site| {
                let reasons: Vec<String> = forward_uses(function, ctx, site.index)
                    .into_iter()
                    .filter(|u| u.kind.is_capture())
                    .map(|u| u.to_string())
                    .collect();
                let escapes = !reasons.is_empty();

                let below = |threshold: u64| {
                    !escapes && site.estimated_bytes.is_some_and(|bytes| bytes < threshold)
                };
                let can_stack_promote = below(self.stack_threshold);
                let can_scalar_replace =
                    site.kind == AllocationKind::Array && below(self.scalar_threshold);

                trace!(
                    "#{} {}: escapes={escapes} stack={can_stack_promote} scalar={can_scalar_replace}",
                    site.index,
                    site.callee
                );

                EscapeRecord {
                    index: site.index,
                    callee: site.callee,
                    kind: site.kind,
                    size_known: site.size_known,
                    estimated_bytes: site.estimated_bytes,
                    escapes,
                    reasons,
                    can_stack_promote,
                    can_scalar_replace,
                }
            })
            .collect();

        debug!(
            "{}: {} allocation sites, {} escaping",
            function.name,
            records.len(),
            records.iter().filter(|r| r.escapes).count()
        );
        Ok(records)
    }

    fn description(&self) -> &'static str {
        "Classifies allocation sites as escaping or stack-promotable"
    }
}
