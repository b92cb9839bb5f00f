//! The trait every analysis pass implements.

use crate::{context::AnalysisContext, ir::Function, Result};

/// A read-only analysis over one function.
///
/// Passes are pure: they never mutate the function or the context, hold no state between
/// runs, and can therefore run concurrently on the aggregator's worker pool. Each pass owns its
/// thresholds, copied out of [`crate::AnalyzerConfig`] when the pass is built.
///
/// # Failure
///
/// Missing information (an unknown callee, an unresolvable type) is never an error; passes
/// degrade to the conservative answer instead. An `Err` means the function broke an invariant
/// that validation should have caught, and the aggregator turns it into an unavailable report
/// section.
pub trait AnalysisPass: Send + Sync {
    /// The pass result stored in the report.
    type Output: Send;

    /// Unique name for logging and findings.
    fn name(&self) -> &'static str;

    /// Runs the pass.
    ///
    /// # Arguments
    ///
    /// * `function` - A validated function body.
    /// * `ctx` - The shared read-only collaborator tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the function violates an IR invariant.
    fn run(&self, function: &Function, ctx: &AnalysisContext) -> Result<Self::Output>;

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}
