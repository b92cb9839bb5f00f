//! Configuration for the analysis engine.
//!
//! Every threshold the passes use lives here as a named default. The bounded-lookahead and
//! size limits are precision/cost trade-offs, not correctness requirements: lowering them makes
//! the engine claim less, never claim something false.

use std::time::Duration;

use bitflags::bitflags;

/// Allocations below this many bytes may be promoted to the stack (default: 4096).
pub const DEFAULT_STACK_THRESHOLD: u64 = 4096;

/// Arrays below this many bytes may be scalar-replaced (default: 256).
pub const DEFAULT_SCALAR_THRESHOLD: u64 = 256;

/// Maximum statements counted per dead branch (default: 20).
///
/// Keeps constant propagation linear in the body length. Counting stops early, so the reported
/// figure can only undercount.
pub const DEFAULT_DEAD_BRANCH_LOOKAHEAD: usize = 20;

/// Largest candidate set still dispatched through a type switch (default: 4).
pub const DEFAULT_MAX_SWITCH_TARGETS: usize = 4;

/// Required variant counts above this are reported as oversized (default: 8).
pub const DEFAULT_OVERSIZED_VARIANT_THRESHOLD: usize = 8;

/// Number of worker threads used by the aggregator, one per pass.
pub const PASS_WORKERS: usize = 5;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Selection of passes the aggregator runs
    pub struct Passes: u8 {
        /// Escape analysis
        const ESCAPE = 0x01;
        /// Constant propagation and dead-branch detection
        const CONSTANTS = 0x02;
        /// Devirtualization analysis
        const DEVIRTUALIZATION = 0x04;
        /// Monomorphization analysis
        const MONOMORPHIZATION = 0x08;
        /// Lifetime analysis
        const LIFETIME = 0x10;
    }
}

impl Default for Passes {
    fn default() -> Self {
        Self::all()
    }
}

/// Weights used to derive the report scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Performance penalty per escaping allocation (default: 10).
    pub escape_penalty: u32,
    /// Cap on the total escape penalty (default: 50).
    pub escape_penalty_cap: u32,
    /// Performance penalty per unresolved virtual call site (default: 5).
    pub unresolved_call_penalty: u32,
    /// Size penalty per statement in a dead branch (default: 1).
    pub dead_statement_penalty: u32,
    /// Size penalty per required monomorphized variant (default: 2).
    pub variant_penalty: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            escape_penalty: 10,
            escape_penalty_cap: 50,
            unresolved_call_penalty: 5,
            dead_statement_penalty: 1,
            variant_penalty: 2,
        }
    }
}

/// Configuration for the [`crate::Analyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Stack promotion size limit in bytes (default: 4096).
    pub stack_threshold: u64,

    /// Scalar replacement size limit in bytes (default: 256).
    pub scalar_threshold: u64,

    /// Dead-branch statement lookahead (default: 20).
    pub dead_branch_lookahead: usize,

    /// Largest candidate set handled by a type switch (default: 4).
    pub max_switch_targets: usize,

    /// Required variant count above which specialization is reported as oversized (default: 8).
    pub oversized_variant_threshold: usize,

    /// The caller expects this function not to allocate on the heap.
    ///
    /// Escaping allocations become critical findings.
    pub expect_no_escapes: bool,

    /// Passes to run (default: all).
    pub passes: Passes,

    /// Upper bound on the time `analyze` waits for its passes (default: none).
    ///
    /// Passes still running at the deadline are reported as unavailable.
    pub timeout: Option<Duration>,

    /// Score weights.
    pub scoring: ScoringConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            stack_threshold: DEFAULT_STACK_THRESHOLD,
            scalar_threshold: DEFAULT_SCALAR_THRESHOLD,
            dead_branch_lookahead: DEFAULT_DEAD_BRANCH_LOOKAHEAD,
            max_switch_targets: DEFAULT_MAX_SWITCH_TARGETS,
            oversized_variant_threshold: DEFAULT_OVERSIZED_VARIANT_THRESHOLD,
            expect_no_escapes: false,
            passes: Passes::all(),
            timeout: None,
            scoring: ScoringConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Creates a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the engine to the given passes.
    #[must_use]
    pub fn with_passes(mut self, passes: Passes) -> Self {
        self.passes = passes;
        self
    }

    /// Sets the analysis deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Marks the function as expected to be allocation-free.
    #[must_use]
    pub fn expecting_no_escapes(mut self) -> Self {
        self.expect_no_escapes = true;
        self
    }

    /// Sets the stack promotion threshold.
    #[must_use]
    pub fn with_stack_threshold(mut self, bytes: u64) -> Self {
        self.stack_threshold = bytes;
        self
    }

    /// Sets the scalar replacement threshold.
    #[must_use]
    pub fn with_scalar_threshold(mut self, bytes: u64) -> Self {
        self.scalar_threshold = bytes;
        self
    }

    /// Sets the dead-branch lookahead.
    #[must_use]
    pub fn with_dead_branch_lookahead(mut self, statements: usize) -> Self {
        self.dead_branch_lookahead = statements;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.stack_threshold, 4096);
        assert_eq!(config.scalar_threshold, 256);
        assert_eq!(config.dead_branch_lookahead, 20);
        assert_eq!(config.max_switch_targets, 4);
        assert_eq!(config.passes, Passes::all());
        assert!(config.timeout.is_none());
        assert!(!config.expect_no_escapes);
    }

    #[test]
    fn test_builder_methods() {
        let config = AnalyzerConfig::new()
            .with_passes(Passes::ESCAPE | Passes::LIFETIME)
            .with_timeout(Duration::from_millis(50))
            .expecting_no_escapes()
            .with_stack_threshold(1024);
        assert!(config.passes.contains(Passes::ESCAPE));
        assert!(!config.passes.contains(Passes::CONSTANTS));
        assert_eq!(config.timeout, Some(Duration::from_millis(50)));
        assert!(config.expect_no_escapes);
        assert_eq!(config.stack_threshold, 1024);
    }
}
