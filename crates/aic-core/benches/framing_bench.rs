//! Criterion benchmarks for the device framing codec.
//!
//! The motion-sensor forwarder frames a message every 100 ms and the recording
//! reader decodes every command, so both paths are measured here.
//!
//! Run with:
//! ```bash
//! cargo bench --package aic-core --bench framing_bench
//! ```

use aic_core::protocol::framing::{decode_varint, encode_varint, frame_payload};
use aic_core::protocol::recording_payload::decode_recording_payload;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ── Benchmark groups ──────────────────────────────────────────────────────────

/// Benchmarks `encode_varint` and `decode_varint` at every prefix width.
fn bench_varint(c: &mut Criterion) {
    let values: &[(&str, u32)] = &[
        ("1_byte", 100),
        ("2_bytes", 10_000),
        ("3_bytes", 1_000_000),
        ("4_bytes", 200_000_000),
    ];

    let mut group = c.benchmark_group("varint");
    for (name, value) in values {
        group.bench_with_input(BenchmarkId::new("encode", name), value, |b, value| {
            b.iter(|| encode_varint(black_box(*value)))
        });
        let encoded = encode_varint(*value);
        group.bench_with_input(BenchmarkId::new("decode", name), &encoded, |b, encoded| {
            b.iter(|| decode_varint(black_box(encoded)).expect("decode must succeed"))
        });
    }
    group.finish();
}

/// Benchmarks `frame_payload` for typical sensor payload sizes.
fn bench_frame_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_payload");
    for size in [16usize, 256, 4096] {
        let payload = vec![0x5Au8; size];
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| frame_payload(black_box(payload)).expect("frame must succeed"))
        });
    }
    group.finish();
}

/// Benchmarks decoding a typical start-recording request.
fn bench_recording_payload(c: &mut Criterion) {
    let name = b"video_2024_01_01.mp4";
    let mut bytes = vec![0x0A, name.len() as u8];
    bytes.extend_from_slice(name);
    bytes.extend_from_slice(&[0x10, 0x01]);

    c.bench_function("decode_recording_payload", |b| {
        b.iter(|| decode_recording_payload(black_box(&bytes)).expect("decode must succeed"))
    });
}

criterion_group!(
    benches,
    bench_varint,
    bench_frame_payload,
    bench_recording_payload
);
criterion_main!(benches);
