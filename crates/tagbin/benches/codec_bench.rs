//! Benchmarks for schema-first and self-describing encoding.
//!
//! Run with: `cargo bench -p tagbin`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tagbin::descriptors::{array, cstring, f64, struct_of, u32};
use tagbin::{Codec, DescriptorExt, IntoDescriptor, Record, Value};

fn user(i: u32) -> Value {
    Value::Object(
        Record::new()
            .with("id", i)
            .with("name", format!("user-{i:05}"))
            .with("score", f64::from(i) * 0.5)
            .with("tags", vec![Value::from("a"), Value::from("bb"), Value::from("ccc")]),
    )
}

fn users(count: u32) -> Value {
    Value::Array((0..count).map(user).collect())
}

/// Benchmark encoding with a known schema.
fn bench_schema_serialize(c: &mut Criterion) {
    let codec = Codec::default();
    let schema = array().typed(struct_of([
        ("id", u32().into_descriptor()),
        ("name", cstring().into_descriptor()),
        ("score", f64().into_descriptor()),
        ("tags", array().typed(cstring()).into_descriptor()),
    ]));

    let mut group = c.benchmark_group("schema_serialize");
    for count in [10, 100, 1000] {
        let value = users(count);
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_with_input(BenchmarkId::from_parameter(count), &value, |b, value| {
            b.iter(|| schema.serialize(&codec, black_box(value)).unwrap());
        });
    }
    group.finish();
}

/// Benchmark self-describing encoding (classification per value).
fn bench_tagged_serialize(c: &mut Criterion) {
    let codec = Codec::default();

    let mut group = c.benchmark_group("tagged_serialize");
    for count in [10, 100, 1000] {
        let value = users(count);
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_with_input(BenchmarkId::from_parameter(count), &value, |b, value| {
            b.iter(|| codec.serialize(black_box(value)).unwrap());
        });
    }
    group.finish();
}

/// Benchmark self-describing decoding.
fn bench_tagged_deserialize(c: &mut Criterion) {
    let codec = Codec::default();

    let mut group = c.benchmark_group("tagged_deserialize");
    for count in [10, 100, 1000] {
        let bytes = codec.serialize(&users(count)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &bytes, |b, bytes| {
            b.iter(|| codec.deserialize(black_box(bytes)).unwrap());
        });
    }
    group.finish();
}

/// Benchmark size computation alone.
fn bench_get_size(c: &mut Criterion) {
    let codec = Codec::default();
    let value = users(1000);

    c.bench_function("get_size_1000", |b| {
        b.iter(|| codec.get_size(black_box(&value)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_schema_serialize,
    bench_tagged_serialize,
    bench_tagged_deserialize,
    bench_get_size
);
criterion_main!(benches);
