//! Benchmarks for fingerprinting and cached resolution.
//!
//! Run with: `cargo bench --bench resolve`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use uast_query::fingerprint::fingerprint;
use uast_query::{Config, Datum, EvalContext, FunctionRegistry, UastContext};

const GO_SOURCE: &str = r#"package main

import (
	"fmt"
	"os"
	"strings"
)

func main() {
	for _, arg := range os.Args[1:] {
		fmt.Println(strings.ToUpper(arg))
	}
}
"#;

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let content = vec![b'x'; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &content, |b, content| {
            b.iter(|| fingerprint(black_box("semantic"), black_box("go"), black_box(content)))
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    group.measurement_time(Duration::from_secs(5));

    let functions = FunctionRegistry::new();
    let args = [Datum::from(GO_SOURCE), Datum::from("go")];

    group.bench_function("cold", |b| {
        b.iter(|| {
            let uast = UastContext::with_tree_sitter(Config::default());
            functions.call("uast", &uast, &EvalContext::new(), black_box(&args))
        })
    });

    let uast = UastContext::with_tree_sitter(Config::default());
    group.bench_function("cached", |b| {
        b.iter(|| functions.call("uast", &uast, &EvalContext::new(), black_box(&args)))
    });

    let tree = functions
        .call("uast", &uast, &EvalContext::new(), &args)
        .unwrap_or(Datum::Null);
    group.bench_function("imports", |b| {
        b.iter(|| functions.call("uast_imports", &uast, &EvalContext::new(), black_box(&[tree.clone()])))
    });

    group.finish();
}

criterion_group!(benches, bench_fingerprint, bench_resolve);
criterion_main!(benches);
