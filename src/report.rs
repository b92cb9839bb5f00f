//! The per-function analysis report.
//!
//! An [`AnalysisReport`] is plain data: every field is a number, string, enum or nested list,
//! and the whole report derives `serde::Serialize` so the reporting layer can export it in any
//! format. Reports are built once by the [`crate::Analyzer`] and never mutated afterwards.
//!
//! Each pass result is wrapped in a three-state [`Section`], so a consumer can tell "the pass
//! ran and found nothing" apart from "the pass could not run".

use serde::Serialize;
use strum::Display;

use crate::{
    analysis::{
        AllocationLifetime, ConstantResults, EscapeRecord, MonomorphizationReport, VirtualCallSite,
    },
    ir::{MethodSignature, StmtIndex},
};

/// Result slot of one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum Section<T> {
    /// The pass did not produce a result; the string says why.
    Absent(String),
    /// The pass ran and found nothing.
    Empty,
    /// The pass ran and found something.
    Populated(T),
}

impl<T: SectionData> Section<T> {
    /// Wraps a pass result, choosing `Empty` when it holds no findings.
    #[must_use]
    pub fn from_data(data: T) -> Self {
        if data.has_content() {
            Self::Populated(data)
        } else {
            Self::Empty
        }
    }
}

impl<T> Section<T> {
    /// Creates an absent section.
    #[must_use]
    pub fn absent(reason: impl Into<String>) -> Self {
        Self::Absent(reason.into())
    }

    /// Returns `true` if the pass did not produce a result.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent(_))
    }

    /// Returns `true` if the pass ran and found nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` if the pass found something.
    #[must_use]
    pub const fn is_populated(&self) -> bool {
        matches!(self, Self::Populated(_))
    }

    /// Returns the pass result, if populated.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Populated(data) => Some(data),
            _ => None,
        }
    }

    /// Returns why the section is absent.
    #[must_use]
    pub fn absent_reason(&self) -> Option<&str> {
        match self {
            Self::Absent(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Pass results that can be empty.
pub trait SectionData {
    /// Returns `true` if there is anything to report.
    fn has_content(&self) -> bool;
}

impl<T> SectionData for Vec<T> {
    fn has_content(&self) -> bool {
        !self.is_empty()
    }
}

impl SectionData for ConstantResults {
    fn has_content(&self) -> bool {
        !self.is_empty()
    }
}

impl SectionData for MonomorphizationReport {
    fn has_content(&self) -> bool {
        !self.is_empty()
    }
}

/// The passes, as named in findings and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PassKind {
    /// Escape analysis
    Escape,
    /// Constant propagation
    Constants,
    /// Devirtualization
    Devirtualization,
    /// Monomorphization
    Monomorphization,
    /// Lifetime analysis
    Lifetime,
}

/// Finding priority, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Heap allocation escaping where none was expected
    Critical,
    /// Dynamic dispatch left on a hot path
    High,
    /// Dead code, oversized specialization
    Medium,
    /// Everything else
    Low,
}

/// One actionable advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Priority
    pub priority: Priority,
    /// The pass that produced it
    pub pass: PassKind,
    /// The statement it concerns, if any
    pub statement: Option<StmtIndex>,
    /// Human-readable description
    pub message: String,
}

/// Derived scores, both in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scores {
    /// Runtime cost: escaping allocations and unresolved dispatch
    pub performance: u32,
    /// Code size: dead statements and required specializations
    pub size: u32,
}

/// Everything the engine found out about one function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// The analyzed function and its parameter types
    pub signature: MethodSignature,
    /// Escape analysis
    pub escapes: Section<Vec<EscapeRecord>>,
    /// Constant propagation and dead branches
    pub constants: Section<ConstantResults>,
    /// Devirtualization
    pub devirtualization: Section<Vec<VirtualCallSite>>,
    /// Monomorphization
    pub monomorphization: Section<MonomorphizationReport>,
    /// Lifetimes of manual allocations
    pub lifetimes: Section<Vec<AllocationLifetime>>,
    /// Derived scores
    pub scores: Scores,
    /// Findings, most urgent first
    pub findings: Vec<Finding>,
}

impl AnalysisReport {
    /// Returns `true` if every enabled pass produced a result.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.escapes.is_absent()
            && !self.constants.is_absent()
            && !self.devirtualization.is_absent()
            && !self.monomorphization.is_absent()
            && !self.lifetimes.is_absent()
    }

    /// Returns the findings of one priority.
    pub fn findings_with(&self, priority: Priority) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(move |f| f.priority == priority)
    }
}
