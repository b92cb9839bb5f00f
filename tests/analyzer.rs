//! End-to-end tests of the analyzer through the public API.
//!
//! Every test builds its IR with `FunctionBuilder`, runs the full [`Analyzer`] and checks the
//! resulting [`AnalysisReport`] sections, scores and findings.

use std::{sync::Arc, time::Duration};

use optscope::prelude::*;

fn vector_f64() -> Type {
    Type::container("Vector", vec![Type::float()])
}

fn analyze(function: &Function, ctx: AnalysisContext) -> AnalysisReport {
    Analyzer::new(ctx)
        .unwrap()
        .analyze(function)
        .unwrap()
}

/// Context with an abstract `Shape` and `n` concrete subtypes implementing `area`.
fn shapes(n: usize) -> AnalysisContext {
    let mut hierarchy = TypeHierarchy::builtin();
    hierarchy.insert("Shape", "Any");
    let mut table = MethodTable::new();
    for i in 0..n {
        let name = format!("Shape{i}");
        hierarchy.insert(name.clone(), "Shape");
        table.register(MethodSignature::new("area", vec![Type::concrete(name)]));
    }
    AnalysisContext::new()
        .with_hierarchy(hierarchy)
        .with_methods(table)
}

#[test]
fn local_array_is_stack_promotable() {
    // [Call(makeArray, [10]), Call(sum, [#1]), Return(#2)]
    let mut b = FunctionBuilder::new("total");
    let arr = b.call("makeArray", vec![ConstValue::Int(10).into()], vector_f64());
    let s = b.call("sum", vec![arr], Type::float());
    b.ret(Some(s));
    let f = b.build().unwrap();

    let ctx = AnalysisContext::new().with_allocator("makeArray", AllocatorSpec::array(Some(8)));
    let report = analyze(&f, ctx);

    let escapes = report.escapes.data().unwrap();
    assert_eq!(escapes.len(), 1);
    let record = &escapes[0];
    assert_eq!(record.kind, AllocationKind::Array);
    assert!(record.size_known);
    assert_eq!(record.estimated_bytes, Some(80));
    assert!(!record.escapes);
    assert!(record.reasons.is_empty());
    assert!(record.can_stack_promote);
    assert!(record.can_scalar_replace);
    assert_eq!(report.scores.performance, 100);
}

#[test]
fn returned_allocation_always_escapes() {
    let mut b = FunctionBuilder::new("make");
    let arr = b.call("zeros", vec![ConstValue::Int(2).into()], vector_f64());
    b.call("length", vec![arr.clone()], Type::int());
    b.ret(Some(arr));
    let f = b.build().unwrap();

    let report = analyze(&f, AnalysisContext::new());
    let record = &report.escapes.data().unwrap()[0];
    assert!(record.escapes);
    assert!(!record.can_stack_promote);
    assert!(!record.can_scalar_replace);
    assert_eq!(record.reasons, vec!["returned at #3".to_string()]);
    assert_eq!(report.scores.performance, 90);
}

#[test]
fn allocation_stored_through_global_escapes() {
    let mut b = FunctionBuilder::new("cache");
    let arr = b.call("zeros", vec![ConstValue::Int(2).into()], vector_f64());
    let g = b.global("CACHE", Type::container("Dict", vec![Type::int(), vector_f64()]), false);
    b.call("setindex!", vec![g, arr, ConstValue::Int(1).into()], Type::nothing());
    b.ret(None);
    let f = b.build().unwrap();

    let report = analyze(&f, AnalysisContext::new());
    let record = &report.escapes.data().unwrap()[0];
    assert!(record.escapes);
    assert_eq!(record.reasons, vec!["stored to global storage at #3".to_string()]);
}

#[test]
fn analyze_is_idempotent() {
    let mut b = FunctionBuilder::new("mixed");
    let shape = b.param(Type::abstract_type("Shape"));
    let arr = b.call("zeros", vec![ConstValue::Int(3).into()], vector_f64());
    let c = b.bool(false);
    b.branch(c, true, 6);
    b.call("area", vec![shape], Type::float());
    b.ret(Some(arr.clone()));
    b.ret(Some(arr));
    let f = b.build().unwrap();

    let analyzer = Analyzer::new(shapes(3)).unwrap();
    let first = analyzer.analyze(&f).unwrap();
    let second = analyzer.analyze(&f).unwrap();
    assert_eq!(first, second);
    assert!(first.is_complete());
}

#[test]
fn literal_true_condition_kills_one_arm() {
    // [Literal(true), ConditionalBranch(#1, fallthrough_is_true), 10 statements, Return]
    let mut b = FunctionBuilder::new("guarded");
    let c = b.bool(true);
    b.branch(c, true, 13);
    for i in 0..10 {
        b.int(i);
    }
    b.ret(None);
    let f = b.build().unwrap();

    let report = analyze(&f, AnalysisContext::new());
    let constants = report.constants.data().unwrap();
    assert_eq!(constants.dead_branches.len(), 1);
    let dead = &constants.dead_branches[0];
    assert_eq!(dead.index, 2);
    assert!(!dead.eliminated_arm);
    assert_eq!(dead.statements_eliminated, 10);
    assert_eq!(report.scores.size, 90);
    assert_eq!(report.findings_with(Priority::Medium).count(), 1);
}

#[test]
fn folded_condition_kills_one_arm() {
    let mut b = FunctionBuilder::new("folded");
    let x = b.int(3);
    let y = b.call("*", vec![x, ConstValue::Int(4).into()], Type::int());
    let c = b.call(">", vec![y, ConstValue::Int(10).into()], Type::bool());
    b.branch(c, false, 6);
    b.ret(None);
    b.ret(None);
    let f = b.build().unwrap();

    let report = analyze(&f, AnalysisContext::new());
    let constants = report.constants.data().unwrap();
    assert_eq!(constants.foldable_count, 2);
    assert_eq!(constants.constant_value(3), Some(&ConstValue::Bool(true)));
    let dead = constants.dead_branch(4).unwrap();
    assert!(!dead.eliminated_arm);
}

#[test]
fn strategy_follows_candidate_count() {
    let mut b = FunctionBuilder::new("measure");
    let shape = b.param(Type::abstract_type("Shape"));
    let a = b.call("area", vec![shape], Type::float());
    b.ret(Some(a));
    let f = b.build().unwrap();

    for (n, expected) in [
        (1, DispatchStrategy::Direct),
        (3, DispatchStrategy::Switch),
        (5, DispatchStrategy::None),
    ] {
        let report = analyze(&f, shapes(n));
        let sites = report.devirtualization.data().unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].strategy, expected, "{n} candidates");
        assert_eq!(sites[0].candidate_targets.len(), n);
        assert!(!sites[0].in_loop);
    }
}

#[test]
fn missing_method_degrades_to_none() {
    let mut b = FunctionBuilder::new("measure");
    let shape = b.param(Type::abstract_type("Shape"));
    let a = b.call("volume", vec![shape], Type::float());
    b.ret(Some(a));
    let f = b.build().unwrap();

    let report = analyze(&f, shapes(2));
    let site = &report.devirtualization.data().unwrap()[0];
    assert_eq!(site.strategy, DispatchStrategy::None);
    assert!(site.candidate_targets.is_empty());
    assert_eq!(report.scores.performance, 95);
}

#[test]
fn variants_are_the_cartesian_product() {
    let mut table = MethodTable::new();
    table.register(MethodSignature::new("kernel", vec![Type::int(), Type::concrete("Int32")]));
    table.register(MethodSignature::new("kernel", vec![Type::float(), Type::concrete("Int16")]));
    table.register(MethodSignature::new(
        "kernel",
        vec![Type::concrete("Float32"), Type::concrete("Int32")],
    ));

    let mut b = FunctionBuilder::new("kernel");
    b.param(Type::abstract_type("Real"));
    b.param(Type::abstract_type("Integer"));
    b.ret(None);
    let f = b.build().unwrap();

    let report = analyze(&f, AnalysisContext::new().with_methods(table));
    let mono = report.monomorphization.data().unwrap();
    assert_eq!(mono.parameters.len(), 2);
    assert_eq!(mono.required_variants, 6);
    assert!(mono.can_fully_monomorphize);
    assert_eq!(report.scores.size, 88);
}

#[test]
fn oversized_specialization_is_medium() {
    let mut b = FunctionBuilder::new("generic");
    b.param(Type::abstract_type("Number"));
    b.param(Type::abstract_type("Integer"));
    b.param(Type::abstract_type("AbstractFloat"));
    b.param(Type::abstract_type("AbstractArray"));
    b.ret(None);
    let f = b.build().unwrap();

    let report = analyze(&f, AnalysisContext::new());
    let mono = report.monomorphization.data().unwrap();
    assert!(mono
        .parameters
        .iter()
        .all(|p| p.source == InstantiationSource::Suggested));
    assert_eq!(mono.required_variants, 16);
    assert!(report
        .findings_with(Priority::Medium)
        .any(|f| f.pass == PassKind::Monomorphization));
}

#[test]
fn returned_manual_allocation_cannot_be_freed() {
    let mut b = FunctionBuilder::new("leak");
    let p = b.call("malloc", vec![ConstValue::Int(32).into()], Type::concrete("Ptr"));
    b.ret(Some(p));
    let f = b.build().unwrap();

    let report = analyze(&f, AnalysisContext::new());
    let lifetime = &report.lifetimes.data().unwrap()[0];
    assert!(!lifetime.can_auto_free);
    assert!(lifetime.free_insertion_index.is_none());
    assert!(lifetime.conflicts.iter().any(|c| c.contains("returned")));
}

#[test]
fn manual_allocation_gets_release_point() {
    let mut b = FunctionBuilder::new("scratch");
    let p = b.call("malloc", vec![ConstValue::Int(32).into()], Type::concrete("Ptr"));
    let x = b.call("unsafe_load", vec![p], Type::int());
    let y = b.call("+", vec![x.clone(), x], Type::int());
    b.ret(Some(y));
    let f = b.build().unwrap();

    let report = analyze(&f, AnalysisContext::new());
    let lifetime = &report.lifetimes.data().unwrap()[0];
    assert_eq!(lifetime.last_use_index, 2);
    assert_eq!(lifetime.free_insertion_index, Some(3));
    assert!(lifetime.can_auto_free);
}

#[test]
fn malformed_input_is_rejected() {
    let f = Function::new(
        "broken",
        Vec::new(),
        vec![Statement::UnconditionalJump { target: 9 }],
    );
    let analyzer = Analyzer::new(AnalysisContext::new()).unwrap();
    assert!(matches!(
        analyzer.analyze(&f),
        Err(Error::InvalidJumpTarget {
            statement: 1,
            target: 9
        })
    ));
}

#[test]
fn generous_timeout_completes() {
    let mut b = FunctionBuilder::new("quick");
    let x = b.int(1);
    b.ret(Some(x));
    let f = b.build().unwrap();

    let config = AnalyzerConfig::new().with_timeout(Duration::from_secs(30));
    let report = Analyzer::with_config(AnalysisContext::new(), config)
        .unwrap()
        .analyze(&f)
        .unwrap();
    assert!(report.is_complete());
}

#[test]
fn disabled_passes_are_absent() {
    let mut b = FunctionBuilder::new("quick");
    let x = b.int(1);
    b.ret(Some(x));
    let f = b.build().unwrap();

    let config = AnalyzerConfig::new().with_passes(Passes::ESCAPE | Passes::LIFETIME);
    let report = Analyzer::with_config(AnalysisContext::new(), config)
        .unwrap()
        .analyze(&f)
        .unwrap();
    assert!(report.escapes.is_empty());
    assert!(report.lifetimes.is_empty());
    assert_eq!(report.constants.absent_reason(), Some("disabled"));
    assert_eq!(report.devirtualization.absent_reason(), Some("disabled"));
    assert_eq!(report.monomorphization.absent_reason(), Some("disabled"));
    assert!(!report.is_complete());
}

#[test]
fn batch_analysis_keeps_order_and_errors() {
    let mut b = FunctionBuilder::new("ok");
    b.ret(None);
    let ok = b.build().unwrap();
    let broken = Function::new("broken", Vec::new(), Vec::new());

    let analyzer = Analyzer::new(AnalysisContext::new()).unwrap();
    let results = analyzer.analyze_many(&[ok.clone(), broken, ok]);
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::Empty(_))));
    assert_eq!(results[2].as_ref().unwrap().signature.name, "ok");
}

#[test]
fn concurrent_callers_share_one_context() {
    let ctx = Arc::new(shapes(2));
    let analyzer = Analyzer::new(Arc::clone(&ctx)).unwrap();

    let mut b = FunctionBuilder::new("measure");
    let shape = b.param(Type::abstract_type("Shape"));
    let a = b.call("area", vec![shape], Type::float());
    b.ret(Some(a));
    let f = b.build().unwrap();
    let expected = analyzer.analyze(&f).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| analyzer.analyze(&f))).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), expected);
        }
    });
    assert!(Arc::ptr_eq(analyzer.context(), &ctx));
}

#[test]
fn report_exports_as_json() {
    let mut b = FunctionBuilder::new("export");
    let arr = b.call("zeros", vec![ConstValue::Int(4).into()], vector_f64());
    b.ret(Some(arr));
    let f = b.build().unwrap();

    let config = AnalyzerConfig::new().with_passes(Passes::all() - Passes::LIFETIME);
    let report = Analyzer::with_config(AnalysisContext::new(), config)
        .unwrap()
        .analyze(&f)
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["signature"]["name"], "export");
    assert_eq!(json["escapes"]["status"], "populated");
    assert_eq!(json["escapes"]["data"][0]["kind"], "array");
    assert_eq!(json["escapes"]["data"][0]["escapes"], true);
    assert_eq!(json["lifetimes"]["status"], "absent");
    assert_eq!(json["lifetimes"]["data"], "disabled");
    assert_eq!(json["devirtualization"]["status"], "empty");
    assert_eq!(json["scores"]["performance"], 90);
    assert_eq!(json["findings"][0]["priority"], "low");
    assert_eq!(json["findings"][0]["pass"], "escape");
}
