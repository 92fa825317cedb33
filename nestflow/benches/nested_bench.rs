//! Benchmarks for nested circuit invocation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nestflow::prelude::*;
use serde_json::json;

fn writer() -> Circuit {
    CircuitBuilder::new("writer")
        .with_config(CircuitConfig {
            emit_events: false,
            ..CircuitConfig::default()
        })
        .step_fn("write", |ctx: &mut Context, _: &FlowOptions| {
            ctx.set("y", json!(9));
            Ok(true)
        })
        .expect("valid step")
        .build()
        .expect("valid circuit")
}

fn nested_benchmark(c: &mut Criterion) {
    let inner = writer();
    let outer = CircuitBuilder::new("outer")
        .with_config(CircuitConfig {
            emit_events: false,
            ..CircuitConfig::default()
        })
        .nested(
            Nested::new(Operand::activity(writer()))
                .input(|ctx: &Context, _: &FlowOptions| ctx.wrap())
                .build()
                .expect("valid composition"),
        )
        .expect("valid nesting")
        .build()
        .expect("valid circuit");

    c.bench_function("flat_call", |b| {
        b.iter(|| black_box(inner.call(Context::from_pairs([("x", json!(0))]))))
    });

    c.bench_function("nested_call", |b| {
        b.iter(|| black_box(outer.call(Context::from_pairs([("x", json!(0))]))))
    });
}

criterion_group!(benches, nested_benchmark);
criterion_main!(benches);
