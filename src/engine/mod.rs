//! The analysis aggregator.
//!
//! The [`Analyzer`] is the main entry point of the crate. It validates a function once, runs the
//! enabled passes concurrently on a small rayon pool and merges their results into an
//! [`AnalysisReport`]:
//!
//! 1. **Validation**: reject malformed IR, the only hard failure
//! 2. **Dispatch**: one pool task per enabled pass
//! 3. **Collection**: results arrive over a channel, bounded by the optional deadline
//! 4. **Scoring**: derive scores and findings from whatever sections were produced
//!
//! A pass that fails, panics or misses the deadline only costs its own section, which is then
//! reported as [`Section::Absent`].
//!
//! # Example
//!
//! ```rust
//! use optscope::{AnalysisContext, Analyzer, FunctionBuilder, Type, ConstValue};
//!
//! let mut b = FunctionBuilder::new("sum3");
//! let arr = b.call("zeros", vec![ConstValue::Int(3).into()], Type::container("Vector", vec![Type::float()]));
//! let s = b.call("sum", vec![arr], Type::float());
//! b.ret(Some(s));
//! let function = b.build()?;
//!
//! let analyzer = Analyzer::new(AnalysisContext::new())?;
//! let report = analyzer.analyze(&function)?;
//! assert!(report.is_complete());
//! assert_eq!(report.scores.performance, 100);
//! # Ok::<(), optscope::Error>(())
//! ```

mod scoring;

use std::{
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    time::Instant,
};

use log::{debug, warn};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};

pub use scoring::{collect_findings, compute_scores};

use crate::{
    analysis::{
        AllocationLifetime, AnalysisPass, ConstantPropagation, ConstantResults, Devirtualization,
        EscapeAnalysis, EscapeRecord, LifetimeAnalysis, Monomorphization, MonomorphizationReport,
        VirtualCallSite,
    },
    config::{AnalyzerConfig, Passes, PASS_WORKERS},
    context::AnalysisContext,
    ir::Function,
    report::{AnalysisReport, PassKind, Scores, Section},
    Error, Result,
};

/// Result of one pass as sent back by its worker.
enum PassOutput {
    Escape(Vec<EscapeRecord>),
    Constants(ConstantResults),
    Devirtualization(Vec<VirtualCallSite>),
    Monomorphization(MonomorphizationReport),
    Lifetime(Vec<AllocationLifetime>),
}

type PassOutcome = (PassKind, std::result::Result<PassOutput, String>);

/// Runs the optimization passes over functions and builds their reports.
///
/// The analyzer owns its worker pool and a shared handle to the [`AnalysisContext`]. It holds
/// no per-call state, so one instance can serve any number of `analyze` calls, including
/// concurrent ones.
pub struct Analyzer {
    config: AnalyzerConfig,
    context: Arc<AnalysisContext>,
    pool: Arc<ThreadPool>,
}

impl Analyzer {
    /// Creates an analyzer with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be created.
    pub fn new(context: impl Into<Arc<AnalysisContext>>) -> Result<Self> {
        Self::with_config(context, AnalyzerConfig::default())
    }

    /// Creates an analyzer with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be created.
    pub fn with_config(
        context: impl Into<Arc<AnalysisContext>>,
        config: AnalyzerConfig,
    ) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(PASS_WORKERS)
            .thread_name(|i| format!("optscope-pass-{i}"))
            .build()
            .map_err(|e| Error::Error(format!("Failed to create pass worker pool: {e}")))?;

        Ok(Self {
            config,
            context: context.into(),
            pool: Arc::new(pool),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Returns the shared context.
    #[must_use]
    pub fn context(&self) -> &Arc<AnalysisContext> {
        &self.context
    }

    /// Analyzes one function.
    ///
    /// # Errors
    ///
    /// Returns an error only if the function fails structural validation. Pass failures,
    /// panics and timeouts are reported as absent sections instead.
    pub fn analyze(&self, function: &Function) -> Result<AnalysisReport> {
        function.validate()?;

        let start = Instant::now();
        let deadline = self.config.timeout.map(|t| start + t);
        let function = Arc::new(function.clone());
        let passes = self.config.passes;
        let (tx, rx) = mpsc::channel();

        let mut expected = 0;
        if passes.contains(Passes::ESCAPE) {
            self.spawn(
                EscapeAnalysis::from_config(&self.config),
                PassKind::Escape,
                PassOutput::Escape,
                &function,
                &tx,
            );
            expected += 1;
        }
        if passes.contains(Passes::CONSTANTS) {
            self.spawn(
                ConstantPropagation::from_config(&self.config),
                PassKind::Constants,
                PassOutput::Constants,
                &function,
                &tx,
            );
            expected += 1;
        }
        if passes.contains(Passes::DEVIRTUALIZATION) {
            self.spawn(
                Devirtualization::from_config(&self.config),
                PassKind::Devirtualization,
                PassOutput::Devirtualization,
                &function,
                &tx,
            );
            expected += 1;
        }
        if passes.contains(Passes::MONOMORPHIZATION) {
            self.spawn(
                Monomorphization::new(),
                PassKind::Monomorphization,
                PassOutput::Monomorphization,
                &function,
                &tx,
            );
            expected += 1;
        }
        if passes.contains(Passes::LIFETIME) {
            self.spawn(
                LifetimeAnalysis::from_config(&self.config),
                PassKind::Lifetime,
                PassOutput::Lifetime,
                &function,
                &tx,
            );
            expected += 1;
        }
        drop(tx);

        let outcomes = collect_outcomes(&rx, expected, deadline);
        let mut report = assemble(&function, passes, outcomes);
        report.scores = compute_scores(&report, &self.config.scoring);
        report.findings = collect_findings(&report, &self.config);

        debug!(
            "{}: analyzed in {:?}, performance {}, size {}, {} findings",
            function.name,
            start.elapsed(),
            report.scores.performance,
            report.scores.size,
            report.findings.len()
        );
        Ok(report)
    }

    /// Analyzes a batch of functions in parallel.
    ///
    /// Each function is analyzed independently; the results are in input order.
    pub fn analyze_many(&self, functions: &[Function]) -> Vec<Result<AnalysisReport>> {
        functions.par_iter().map(|f| self.analyze(f)).collect()
    }

    fn spawn<P>(
        &self,
        pass: P,
        kind: PassKind,
        wrap: fn(P::Output) -> PassOutput,
        function: &Arc<Function>,
        tx: &Sender<PassOutcome>,
    ) where
        P: AnalysisPass + 'static,
    {
        let function = Arc::clone(function);
        let context = Arc::clone(&self.context);
        let tx = tx.clone();

        self.pool.spawn(move || {
            let outcome = match catch_unwind(AssertUnwindSafe(|| pass.run(&function, &context))) {
                Ok(Ok(output)) => Ok(wrap(output)),
                Ok(Err(e)) => Err(format!("{} failed: {e}", pass.name())),
                Err(payload) => Err(format!("{} panicked: {}", pass.name(), panic_message(&*payload))),
            };
            // The receiver is gone once the deadline has passed
            let _ = tx.send((kind, outcome));
        });
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Receives up to `expected` outcomes, giving up at the deadline.
fn collect_outcomes(
    rx: &Receiver<PassOutcome>,
    expected: usize,
    deadline: Option<Instant>,
) -> HashMap<PassKind, std::result::Result<PassOutput, String>> {
    let mut outcomes = HashMap::with_capacity(expected);
    while outcomes.len() < expected {
        let received = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(remaining) {
                    Ok(outcome) => Some(outcome),
                    Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
                }
            }
            None => rx.recv().ok(),
        };
        let Some((kind, outcome)) = received else {
            break;
        };
        outcomes.insert(kind, outcome);
    }
    outcomes
}

fn assemble(
    function: &Function,
    passes: Passes,
    mut outcomes: HashMap<PassKind, std::result::Result<PassOutput, String>>,
) -> AnalysisReport {
    let mut report = AnalysisReport {
        signature: function.signature(),
        escapes: Section::absent("disabled"),
        constants: Section::absent("disabled"),
        devirtualization: Section::absent("disabled"),
        monomorphization: Section::absent("disabled"),
        lifetimes: Section::absent("disabled"),
        scores: Scores {
            performance: 100,
            size: 100,
        },
        findings: Vec::new(),
    };

    for (kind, flag) in [
        (PassKind::Escape, Passes::ESCAPE),
        (PassKind::Constants, Passes::CONSTANTS),
        (PassKind::Devirtualization, Passes::DEVIRTUALIZATION),
        (PassKind::Monomorphization, Passes::MONOMORPHIZATION),
        (PassKind::Lifetime, Passes::LIFETIME),
    ] {
        if !passes.contains(flag) {
            continue;
        }
        match outcomes.remove(&kind) {
            Some(Ok(output)) => match output {
                PassOutput::Escape(data) => report.escapes = Section::from_data(data),
                PassOutput::Constants(data) => report.constants = Section::from_data(data),
                PassOutput::Devirtualization(data) => {
                    report.devirtualization = Section::from_data(data);
                }
                PassOutput::Monomorphization(data) => {
                    report.monomorphization = Section::from_data(data);
                }
                PassOutput::Lifetime(data) => report.lifetimes = Section::from_data(data),
            },
            Some(Err(reason)) => {
                warn!("{}: {kind} section unavailable: {reason}", function.name);
                set_absent(&mut report, kind, reason);
            }
            None => {
                warn!("{}: {kind} did not finish before the deadline", function.name);
                set_absent(&mut report, kind, "timed out".to_string());
            }
        }
    }
    report
}

fn set_absent(report: &mut AnalysisReport, kind: PassKind, reason: String) {
    match kind {
        PassKind::Escape => report.escapes = Section::Absent(reason),
        PassKind::Constants => report.constants = Section::Absent(reason),
        PassKind::Devirtualization => report.devirtualization = Section::Absent(reason),
        PassKind::Monomorphization => report.monomorphization = Section::Absent(reason),
        PassKind::Lifetime => report.lifetimes = Section::Absent(reason),
    }
}
