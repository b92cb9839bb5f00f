//! Scores and priority-ranked findings derived from the pass sections.
//!
//! Both functions only read populated sections; an absent section contributes neither penalties
//! nor findings.

use crate::{
    analysis::DispatchStrategy,
    config::{AnalyzerConfig, ScoringConfig},
    report::{AnalysisReport, Finding, PassKind, Priority, Scores},
};

const MAX_SCORE: u32 = 100;

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Computes the performance and size scores.
#[must_use]
pub fn compute_scores(report: &AnalysisReport, weights: &ScoringConfig) -> Scores {
    let escaping = report
        .escapes
        .data()
        .map_or(0, |records| records.iter().filter(|r| r.escapes).count());
    let unresolved = report
        .devirtualization
        .data()
        .map_or(0, |sites| sites.iter().filter(|s| s.is_unresolved()).count());
    let dead_statements = report.constants.data().map_or(0, |c| c.dead_statements());
    let variants = report
        .monomorphization
        .data()
        .map_or(0, |m| m.required_variants);

    let escape_penalty = count(escaping)
        .saturating_mul(weights.escape_penalty)
        .min(weights.escape_penalty_cap);
    let performance = MAX_SCORE
        .saturating_sub(escape_penalty)
        .saturating_sub(count(unresolved).saturating_mul(weights.unresolved_call_penalty));

    let size = MAX_SCORE
        .saturating_sub(count(dead_statements).saturating_mul(weights.dead_statement_penalty))
        .saturating_sub(count(variants).saturating_mul(weights.variant_penalty));

    Scores { performance, size }
}

/// Flattens the sections into findings, most urgent first, then by statement.
#[must_use]
pub fn collect_findings(report: &AnalysisReport, config: &AnalyzerConfig) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut push = |priority, pass, statement, message: String| {
        findings.push(Finding {
            priority,
            pass,
            statement,
            message,
        });
    };

    for r in report.escapes.data().into_iter().flatten() {
        if r.escapes {
            let priority = if config.expect_no_escapes {
                Priority::Critical
            } else {
                Priority::Low
            };
            push(
                priority,
                PassKind::Escape,
                Some(r.index),
                format!(
                    "{} allocation by '{}' escapes: {}",
                    r.kind,
                    r.callee,
                    r.reasons.join(", ")
                ),
            );
            continue;
        }
        let size = r
            .estimated_bytes
            .map_or_else(String::new, |b| format!(" ({b} bytes)"));
        if r.can_scalar_replace {
            push(
                Priority::Low,
                PassKind::Escape,
                Some(r.index),
                format!("{} allocation by '{}'{size} can be scalar-replaced", r.kind, r.callee),
            );
        } else if r.can_stack_promote {
            push(
                Priority::Low,
                PassKind::Escape,
                Some(r.index),
                format!("{} allocation by '{}'{size} can be stack-promoted", r.kind, r.callee),
            );
        }
    }

    if let Some(constants) = report.constants.data() {
        for d in &constants.dead_branches {
            push(
                Priority::Medium,
                PassKind::Constants,
                Some(d.index),
                format!(
                    "branch arm for `{}` is never taken ({} statements)",
                    d.eliminated_arm, d.statements_eliminated
                ),
            );
        }
    }

    for s in report.devirtualization.data().into_iter().flatten() {
        let (priority, message) = match s.strategy {
            DispatchStrategy::Direct => (
                Priority::Low,
                format!("call to '{}' can be dispatched directly", s.callee),
            ),
            DispatchStrategy::Switch => (
                Priority::Low,
                format!(
                    "call to '{}' can use a {}-way type switch",
                    s.callee,
                    s.candidate_targets.len()
                ),
            ),
            DispatchStrategy::None => {
                let priority = if s.in_loop {
                    Priority::High
                } else {
                    Priority::Low
                };
                let detail = if s.symbol_known {
                    format!("{} candidates", s.candidate_targets.len())
                } else {
                    "not in the method table".to_string()
                };
                (
                    priority,
                    format!(
                        "call to '{}' on {} stays dynamic ({detail})",
                        s.callee, s.receiver_type
                    ),
                )
            }
        };
        push(priority, PassKind::Devirtualization, Some(s.index), message);
    }

    if let Some(mono) = report.monomorphization.data() {
        if mono.required_variants > config.oversized_variant_threshold {
            push(
                Priority::Medium,
                PassKind::Monomorphization,
                None,
                format!(
                    "full specialization needs {} variants",
                    mono.required_variants
                ),
            );
        }
        for p in &mono.parameters {
            let targets: Vec<String> = p
                .concrete_instantiations
                .iter()
                .map(ToString::to_string)
                .collect();
            let message = if targets.is_empty() {
                format!("parameter {} ({}) has no known instantiation", p.position, p.declared_type)
            } else {
                format!(
                    "parameter {} ({}) can be specialized to {} ({})",
                    p.position,
                    p.declared_type,
                    targets.join(", "),
                    p.source
                )
            };
            push(Priority::Low, PassKind::Monomorphization, None, message);
        }
    }

    for l in report.lifetimes.data().into_iter().flatten() {
        let message = match l.free_insertion_index {
            Some(at) => format!("'{}' allocation can be released before #{at}", l.callee),
            None if l.conflicts.is_empty() => {
                format!("'{}' allocation has no safe release point", l.callee)
            }
            None => format!(
                "'{}' allocation cannot be auto-released: {}",
                l.callee,
                l.conflicts.join(", ")
            ),
        };
        push(Priority::Low, PassKind::Lifetime, Some(l.index), message);
    }

    findings.sort_by_key(|f| (f.priority, f.statement.unwrap_or(0)));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{ConstValue, FunctionBuilder, Type},
        test::{area_loop, dead_else, escaping_buffer, local_sum, shapes_context, vector_of},
        AnalysisContext, Analyzer, AnalyzerConfig, Passes,
    };

    fn report_for(
        function: &crate::Function,
        ctx: AnalysisContext,
        config: AnalyzerConfig,
    ) -> AnalysisReport {
        Analyzer::with_config(ctx, config)
            .unwrap()
            .analyze(function)
            .unwrap()
    }

    #[test]
    fn test_clean_function_scores_full() {
        let report = report_for(&local_sum(), AnalysisContext::new(), AnalyzerConfig::new());
        assert_eq!(report.scores, Scores { performance: 100, size: 100 });
        assert_eq!(report.findings.len(), 1);
        assert!(report.findings[0].message.contains("scalar-replaced"));
    }

    #[test]
    fn test_escape_penalty_is_capped() {
        let mut b = FunctionBuilder::new("leaky");
        for _ in 0..7 {
            let v = b.call(
                "zeros",
                vec![ConstValue::Int(2).into()],
                vector_of(Type::float()),
            );
            b.call("push!", vec![v], Type::nothing());
        }
        b.ret(None);
        let f = b.build().unwrap();

        let report = report_for(&f, AnalysisContext::new(), AnalyzerConfig::new());
        assert_eq!(report.scores.performance, 50);
        assert_eq!(report.findings_with(Priority::Low).count(), 7);
    }

    #[test]
    fn test_dead_statements_cost_size() {
        let report = report_for(&dead_else(), AnalysisContext::new(), AnalyzerConfig::new());
        assert_eq!(report.scores.size, 90);
        let medium: Vec<_> = report.findings_with(Priority::Medium).collect();
        assert_eq!(medium.len(), 1);
        assert_eq!(medium[0].statement, Some(2));
        assert_eq!(medium[0].pass, PassKind::Constants);
    }

    #[test]
    fn test_unresolved_call_in_loop_is_high() {
        let report = report_for(&area_loop(), shapes_context(5), AnalyzerConfig::new());
        assert_eq!(report.scores.performance, 95);
        let first = &report.findings[0];
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.statement, Some(1));

        let report = report_for(&area_loop(), shapes_context(2), AnalyzerConfig::new());
        assert_eq!(report.scores.performance, 100);
        assert_eq!(report.findings_with(Priority::High).count(), 0);
    }

    #[test]
    fn test_absent_sections_add_nothing() {
        let config = AnalyzerConfig::new().with_passes(Passes::MONOMORPHIZATION);
        let report = report_for(&escaping_buffer(), AnalysisContext::new(), config);
        assert_eq!(report.scores, Scores { performance: 100, size: 100 });
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_findings_are_sorted() {
        let config = AnalyzerConfig::new().expecting_no_escapes();
        let report = report_for(&escaping_buffer(), AnalysisContext::new(), config);
        assert!(report
            .findings
            .windows(2)
            .all(|w| (w[0].priority, w[0].statement) <= (w[1].priority, w[1].statement)));
        assert_eq!(report.findings[0].priority, Priority::Critical);
        assert!(report.findings[0]
            .message
            .contains("passed to unknown callee 'push!' at #2, returned at #3"));
    }
}
