#![allow(missing_docs)]
//! Parallel decoding benchmarks using rayon.
//!
//! Compares the sequential stream decoder with frame-level parallel decoding
//! of one large buffer, and with decoding several collection files at once.

use bsonrec::collection::load_collection;
use bsonrec::parallel::{decode_parallel, load_collections_parallel};
use bsonrec::{decode_with_mode, encode_document, Document, RecoveryMode};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::PathBuf;

fn build_stream(count: i32) -> Vec<u8> {
    let mut buffer = Vec::new();
    for n in 0..count {
        let document = Document::builder()
            .field("_id", format!("doc-{n}"))
            .field("n", n)
            .field("tags", vec!["alpha", "beta", "gamma", "delta"])
            .field(
                "meta",
                Document::builder()
                    .field("source", "import")
                    .field("weight", f64::from(n) / 7.0)
                    .build(),
            )
            .build();
        if let Ok(bytes) = encode_document(&document) {
            buffer.extend(bytes);
        }
    }
    buffer
}

fn benchmark_sequential_10k(c: &mut Criterion) {
    let buffer = build_stream(10_000);
    c.bench_function("sequential_10k_documents", |b| {
        b.iter(|| decode_with_mode(black_box(&buffer), RecoveryMode::Lenient).len());
    });
}

fn benchmark_parallel_10k(c: &mut Criterion) {
    let buffer = build_stream(10_000);
    c.bench_function("parallel_10k_documents", |b| {
        b.iter(|| decode_parallel(black_box(&buffer), RecoveryMode::Lenient).len());
    });
}

fn benchmark_collections(c: &mut Criterion) {
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };
    let buffer = build_stream(2_000);
    let paths: Vec<PathBuf> = (0..8)
        .map(|i| dir.path().join(format!("collection{i}.bson")))
        .filter(|path| std::fs::write(path, &buffer).is_ok())
        .collect();

    let mut group = c.benchmark_group("collections_8x_2k");
    group.bench_function("sequential", |b| {
        b.iter(|| {
            paths
                .iter()
                .filter_map(|path| load_collection(path, RecoveryMode::Lenient).ok())
                .map(|dump| dump.len())
                .sum::<usize>()
        });
    });
    group.bench_function("parallel", |b| {
        b.iter(|| {
            load_collections_parallel(black_box(&paths), RecoveryMode::Lenient)
                .into_iter()
                .filter_map(Result::ok)
                .map(|dump| dump.len())
                .sum::<usize>()
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_sequential_10k,
    benchmark_parallel_10k,
    benchmark_collections
);
criterion_main!(benches);
