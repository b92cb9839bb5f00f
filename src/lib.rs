// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # optscope
//!
//! A static optimization-opportunity analyzer for typed functions in SSA form.
//!
//! Given the typed, linear IR of one function, `optscope` answers five questions a compiler
//! author or performance engineer cares about, and merges the answers into a single report:
//!
//! - **Escape analysis** - which heap allocations never leave the function, and could live on
//!   the stack or be replaced by scalars
//! - **Constant propagation** - which values are compile-time constants, and which branch arms
//!   can never execute
//! - **Devirtualization** - which dynamically dispatched calls resolve to one or a few targets
//! - **Monomorphization** - which abstract parameters can be specialized, and into how many
//!   variants
//! - **Lifetime analysis** - where manually allocated memory can be released automatically
//!
//! The engine never lowers code, evaluates user functions or rewrites the IR. It is purely
//! advisory, and every positive claim it makes is sound: when information is missing it answers
//! "no".
//!
//! ## Quick Start
//!
//! ```rust
//! use optscope::prelude::*;
//!
//! let mut b = FunctionBuilder::new("scale");
//! let n = b.param(Type::int());
//! let buf = b.call("zeros", vec![ConstValue::Int(8).into()], Type::container("Vector", vec![Type::float()]));
//! let total = b.call("sum", vec![buf], Type::float());
//! let scaled = b.call("*", vec![total, n], Type::float());
//! b.ret(Some(scaled));
//! let function = b.build()?;
//!
//! let analyzer = Analyzer::new(AnalysisContext::new())?;
//! let report = analyzer.analyze(&function)?;
//!
//! let escapes = report.escapes.data().expect("one allocation site");
//! assert!(escapes[0].can_scalar_replace);
//! for finding in &report.findings {
//!     println!("[{}] {}", finding.priority, finding.message);
//! }
//! # Ok::<(), optscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ir`] - the function model: statements, operands, types and the type hierarchy
//! - [`context`] - the read-only collaborator tables shared by every pass
//! - [`analysis`] - the five passes, each behind [`analysis::AnalysisPass`]
//! - [`Analyzer`] - runs the passes concurrently and builds the [`AnalysisReport`]
//! - [`report`] - the plain-data report, serializable with `serde`
//!
//! ## Error Handling
//!
//! Only malformed input is an error. A function is validated once when it is built or analyzed;
//! everything after that degrades instead of failing:
//!
//! ```rust
//! use optscope::{Error, Function, Operand, Statement};
//!
//! let broken = Function::new("f", Vec::new(), vec![Statement::Return { value: Some(Operand::Value(7)) }]);
//! match broken.validate() {
//!     Err(Error::DanglingReference { statement, reference }) => {
//!         assert_eq!((statement, reference), (1, 7));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! A pass that fails or does not finish in time only leaves its own report [`Section`] absent.
//!
//! ## Logging
//!
//! The crate logs through the `log` facade and never installs a logger. Per-pass summaries are
//! emitted at `debug`, per-site decisions at `trace`, and unavailable sections at `warn`.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use optscope::prelude::*;
///
/// let analyzer = Analyzer::with_config(AnalysisContext::new(), AnalyzerConfig::default())?;
/// assert_eq!(analyzer.config().stack_threshold, 4096);
/// # Ok::<(), optscope::Error>(())
/// ```
pub mod prelude;

/// The five optimization passes.
pub mod analysis;

/// Engine configuration and threshold defaults.
pub mod config;

/// The collaborator tables passed to every pass.
pub mod context;

/// The typed SSA function model.
///
/// # Examples
///
/// ```rust
/// use optscope::{FunctionBuilder, Statement, Type};
///
/// let mut b = FunctionBuilder::new("inc");
/// let x = b.param(Type::int());
/// let y = b.call("+", vec![x, optscope::ConstValue::Int(1).into()], Type::int());
/// b.ret(Some(y));
/// let f = b.build()?;
/// assert_eq!(f.len(), 2);
/// assert!(matches!(f.statement(2), Some(Statement::Return { .. })));
/// # Ok::<(), optscope::Error>(())
/// ```
pub mod ir;

/// The analysis report and its sections.
pub mod report;

pub(crate) mod engine;
pub(crate) mod utils;

/// `optscope` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `optscope` Error type
///
/// Raised only for structurally invalid input. See [`Error`] for the variants.
pub use error::Error;

/// The analysis aggregator and its scoring helpers.
pub use engine::{collect_findings, compute_scores, Analyzer};

pub use config::{AnalyzerConfig, Passes, ScoringConfig};
pub use context::AnalysisContext;
pub use ir::{ConstValue, Function, FunctionBuilder, MethodSignature, Operand, Statement, Type, TypeHierarchy};
pub use report::{AnalysisReport, Finding, Priority, Scores, Section};
