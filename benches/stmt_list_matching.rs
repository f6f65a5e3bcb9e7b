//! Benchmarks for statement-list container matching
//!
//! Measures:
//! - A single container match against blocks of growing length
//! - Whole-tree patch application over nested switch/select programs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashSet;
use structpatch::ast::{Node, Pos, Region, Value};
use structpatch::engine::{ContainerId, Data, Matcher, MatcherCompiler};
use structpatch::{EngineConfig, PatchCompiler, PatchSpec};
use test_utils::ir::SourceWriter;

/// A block of `n` calls, with `target()` as the last statement.
fn flat_block(n: usize) -> Arc<Node> {
    let mut w = SourceWriter::new();
    w.block(|w| {
        let mut stmts: Vec<_> = (0..n.saturating_sub(1)).map(|_| w.call_stmt("work", &["x"])).collect();
        stmts.push(w.call_stmt("target", &[]));
        stmts
    })
}

/// `n` switch and select statements, each with three clauses.
fn nested_program(n: usize) -> Arc<Node> {
    let mut w = SourceWriter::new();
    w.block(|w| {
        (0..n)
            .flat_map(|_| {
                let sw = w.switch(Some("v"), |w| {
                    vec![
                        w.case_clause(&["x"], |w| vec![w.call_stmt("work", &[]), w.call_stmt("target", &[])]),
                        w.case_clause(&["y"], |w| vec![w.ret(Some("x"))]),
                        w.case_clause(&[], |w| vec![w.call_stmt("target", &[])]),
                    ]
                });
                let sel = w.select(|w| {
                    vec![
                        w.comm_clause(Some("ch"), |w| vec![w.call_stmt("target", &[])]),
                        w.comm_clause(None, |w| vec![w.block_stmt(|w| vec![w.call_stmt("target", &[])])]),
                    ]
                });
                [sw, sel]
            })
            .collect()
    })
}

fn target_patch() -> PatchSpec {
    let mut w = SourceWriter::new();
    let minus = vec![w.call_stmt("target", &[])];
    let plus = vec![w.call_stmt("traced", &[]), w.call_stmt("target", &[])];
    PatchSpec {
        name: "trace-target".into(),
        metavars: vec![],
        minus,
        plus,
        span: Region::new(Pos(0), w.pos()),
    }
}

fn bench_container_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("container_match");
    let spec = target_patch();
    let matcher = MatcherCompiler::new(FxHashSet::default(), spec.span).compile_stmt_list(ContainerId(0), &spec.minus);

    for n in [4, 32, 256] {
        let block = flat_block(n);
        let value = Value::Node(block.clone());
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(matcher.match_value(&value, &Data::new(), block.region())))
        });
    }

    group.finish();
}

fn bench_patch_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch_apply");
    let patch = PatchCompiler::new().compile(&target_patch());
    let config = EngineConfig::default();

    for n in [1, 16, 128] {
        let root = nested_program(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(patch.apply(&root, &config)))
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets =
        bench_container_match,
        bench_patch_apply
}

criterion_main!(benches);
