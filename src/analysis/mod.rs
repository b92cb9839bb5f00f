//! The five optimization analyses.
//!
//! Every pass is a pure function of a validated [`crate::ir::Function`] and the shared
//! [`crate::context::AnalysisContext`], exposed through the [`AnalysisPass`] trait. Passes do not
//! consume each other's output; devirtualization and lifetime analysis run their own
//! (linear, cheap) constant propagation sweep where they need resolved values.
//!
//! # Passes
//!
//! | Pass | Output |
//! |------|--------|
//! | [`EscapeAnalysis`] | one [`EscapeRecord`] per allocation site |
//! | [`ConstantPropagation`] | [`ConstantResults`]: constants, dead branches, fold count |
//! | [`Devirtualization`] | one [`VirtualCallSite`] per call on a non-concrete receiver |
//! | [`Monomorphization`] | [`MonomorphizationReport`] for the function's signature |
//! | [`LifetimeAnalysis`] | one [`AllocationLifetime`] per manual allocation |
//!
//! # Soundness
//!
//! Only positive claims matter for soundness: stack-promotable, devirtualizable, dead branch,
//! auto-freeable. Each pass answers "no" whenever the information needed to say "yes" is
//! missing.

mod allocation;
mod constants;
mod devirtualize;
mod escape;
mod lifetime;
mod monomorphize;
mod pass;
mod uses;

pub use allocation::{allocation_sites, AllocationSite};
pub use constants::{
    ConstantPropagation, ConstantRecord, ConstantResults, DeadBranchRecord, PureOp, ScalarValue,
};
pub use devirtualize::{Devirtualization, DispatchStrategy, VirtualCallSite};
pub use escape::{EscapeAnalysis, EscapeRecord};
pub use lifetime::{AllocationLifetime, LifetimeAnalysis};
pub use monomorphize::{
    AbstractParameter, InstantiationSource, Monomorphization, MonomorphizationReport,
};
pub use pass::AnalysisPass;
pub use uses::{forward_uses, UseKind, ValueUse};
