//! Benchmarks for the analyzer.
//!
//! Measures the individual passes and the full aggregator on a synthetic function that mixes
//! allocations, foldable arithmetic, constant branches and virtual calls.

extern crate optscope;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use optscope::prelude::*;
use std::hint::black_box;

/// Context with an abstract `Shape` and three concrete subtypes implementing `area`.
fn context() -> AnalysisContext {
    let mut hierarchy = TypeHierarchy::builtin();
    hierarchy.insert("Shape", "Any");
    let mut table = MethodTable::new();
    for name in ["Circle", "Square", "Triangle"] {
        hierarchy.insert(name, "Shape");
        table.register(MethodSignature::new("area", vec![Type::concrete(name)]));
    }
    AnalysisContext::new()
        .with_hierarchy(hierarchy)
        .with_methods(table)
}

/// Builds a function of `blocks` repetitions of a small mixed block.
fn synthetic(blocks: usize) -> Function {
    let mut b = FunctionBuilder::new("synthetic");
    let shape = b.param(Type::abstract_type("Shape"));
    let vector = Type::container("Vector", vec![Type::float()]);

    for i in 0..blocks {
        let n = b.int(i64::try_from(i % 16).unwrap_or(0) + 1);
        let arr = b.call("zeros", vec![n.clone()], vector.clone());
        let len = b.call("length", vec![arr], Type::int());
        let doubled = b.call("*", vec![n, ConstValue::Int(2).into()], Type::int());
        let cond = b.call(">", vec![doubled, ConstValue::Int(8).into()], Type::bool());
        let skip = b.next_index() + 3;
        b.branch(cond, true, skip);
        b.call("area", vec![shape.clone()], Type::float());
        let p = b.call("malloc", vec![len], Type::concrete("Ptr"));
        b.call("unsafe_load", vec![p], Type::int());
    }
    b.ret(None);
    b.build().unwrap()
}

fn bench_passes(c: &mut Criterion) {
    let ctx = context();
    let function = synthetic(64);

    c.bench_function("pass_escape", |b| {
        b.iter(|| black_box(EscapeAnalysis::default().run(black_box(&function), &ctx)))
    });
    c.bench_function("pass_constants", |b| {
        b.iter(|| black_box(ConstantPropagation::default().run(black_box(&function), &ctx)))
    });
    c.bench_function("pass_devirtualization", |b| {
        b.iter(|| black_box(Devirtualization::default().run(black_box(&function), &ctx)))
    });
    c.bench_function("pass_lifetime", |b| {
        b.iter(|| black_box(LifetimeAnalysis::default().run(black_box(&function), &ctx)))
    });
}

fn bench_analyzer(c: &mut Criterion) {
    let analyzer = Analyzer::new(context()).unwrap();
    let mut group = c.benchmark_group("analyze");

    for blocks in [8usize, 64, 256] {
        let function = synthetic(blocks);
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &function, |b, f| {
            b.iter(|| black_box(analyzer.analyze(black_box(f)).unwrap()))
        });
    }
    group.finish();

    let batch: Vec<Function> = (0..32).map(|_| synthetic(16)).collect();
    c.bench_function("analyze_many_32", |b| {
        b.iter(|| black_box(analyzer.analyze_many(black_box(&batch))))
    });
}

criterion_group!(benches, bench_passes, bench_analyzer);
criterion_main!(benches);
