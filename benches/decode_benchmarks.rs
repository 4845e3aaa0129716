#![allow(missing_docs)]
//! Decoding benchmarks: whole-buffer stream decoding, incremental reading
//! and JSON rendering.

use bsonrec::{
    decode, decode_with_report, encode_document, to_json, BsonReader, Document, JsonMode,
    ObjectId, Value,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;

/// A catalogue record shaped like the documents of a real dump.
fn sample_document(seq: u32) -> Document {
    let mut oid = [0u8; 12];
    oid[8..].copy_from_slice(&seq.to_be_bytes());
    Document::builder()
        .field("_id", ObjectId::from_bytes(oid))
        .field(
            "dc",
            Document::builder()
                .field("title", format!("Record {seq}"))
                .field("creator", vec!["Doe, Jane", "Roe, Richard"])
                .field("subject", vec!["maps", "surveys", "coastlines"])
                .build(),
        )
        .field("seq", i64::from(seq))
        .field("published", seq % 3 != 0)
        .field("modified", Value::DateTime(1_600_000_000_000 + i64::from(seq)))
        .build()
}

/// Encode `count` documents back-to-back.
fn build_stream(count: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    for seq in 0..count {
        if let Ok(bytes) = encode_document(&sample_document(seq)) {
            buffer.extend(bytes);
        }
    }
    buffer
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for count in [100u32, 1_000, 10_000] {
        let buffer = build_stream(count);
        group.throughput(Throughput::Bytes(buffer.len() as u64));
        group.bench_with_input(BenchmarkId::new("stream", count), &buffer, |b, buffer| {
            b.iter(|| decode(black_box(buffer)).len());
        });
        group.bench_with_input(BenchmarkId::new("report", count), &buffer, |b, buffer| {
            b.iter(|| decode_with_report(black_box(buffer)).bytes_consumed);
        });
    }
    group.finish();
}

fn benchmark_reader(c: &mut Criterion) {
    let buffer = build_stream(1_000);
    c.bench_function("reader_1k_documents", |b| {
        b.iter(|| {
            let mut reader = BsonReader::new(Cursor::new(black_box(&buffer)));
            let mut count = 0;
            while let Ok(Some(_document)) = reader.read_document() {
                count += 1;
            }
            count
        });
    });
}

fn benchmark_truncated_tail(c: &mut Criterion) {
    let mut buffer = build_stream(1_000);
    buffer.extend_from_slice(&1_000_000i32.to_le_bytes());
    c.bench_function("decode_1k_truncated_tail", |b| {
        b.iter(|| decode_with_report(black_box(&buffer)).truncated());
    });
}

fn benchmark_json(c: &mut Criterion) {
    let documents = decode(&build_stream(1_000));
    let mut group = c.benchmark_group("json");
    for mode in [JsonMode::Relaxed, JsonMode::Canonical] {
        group.bench_function(mode.to_string(), |b| {
            b.iter(|| {
                documents
                    .iter()
                    .map(|document| to_json(black_box(document), mode))
                    .count()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_decode,
    benchmark_reader,
    benchmark_truncated_tail,
    benchmark_json
);
criterion_main!(benches);
