//! # optscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the optscope library. Import this module to get quick access to the essential
//! types for building functions, running the analyzer and reading its report.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all optscope operations
pub use crate::Error;

/// The result type used throughout optscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Runs the passes and builds the report
pub use crate::Analyzer;

/// Engine configuration
pub use crate::config::{AnalyzerConfig, Passes, ScoringConfig};

/// Shared collaborator tables
pub use crate::context::{
    AllocationKind, AllocatorSpec, AnalysisContext, MethodTable, SizeRule,
};

// ================================================================================================
// Function Model
// ================================================================================================

/// IR building blocks
pub use crate::ir::{
    ConstValue, Function, FunctionBuilder, MethodSignature, Operand, Statement, StmtIndex, Type,
    TypeHierarchy,
};

// ================================================================================================
// Passes
// ================================================================================================

/// The pass trait and the individual passes
pub use crate::analysis::{
    AnalysisPass, ConstantPropagation, Devirtualization, EscapeAnalysis, LifetimeAnalysis,
    Monomorphization,
};

/// Per-pass result types
pub use crate::analysis::{
    AbstractParameter, AllocationLifetime, ConstantRecord, ConstantResults, DeadBranchRecord,
    DispatchStrategy, EscapeRecord, InstantiationSource, MonomorphizationReport, VirtualCallSite,
};

// ================================================================================================
// Report
// ================================================================================================

/// The aggregated report
pub use crate::report::{AnalysisReport, Finding, PassKind, Priority, Scores, Section};
