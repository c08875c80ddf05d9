//! Criterion benchmarks for lll_logger

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lll_logger::prelude::*;
use lll_logger::{emit_probability, AdaptiveSampler};
use std::io;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn discard_handle(level: &str) -> LoggerHandle {
    let manager = Arc::new(SinkManager::default());
    manager.override_sink(io::sink());
    LoggerHandle::builder("bench")
        .level(level)
        .manager(manager)
        .build()
        .unwrap()
}

// ============================================================================
// Level Gating Benchmarks
// ============================================================================

fn bench_level_gating(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_gating");
    group.throughput(Throughput::Elements(1));

    let log = discard_handle("none");

    group.bench_function("suppressed_network", |b| {
        b.iter(|| log.log_network(black_box("suppressed")));
    });

    group.bench_function("suppressed_macro", |b| {
        b.iter(|| log_network!(log, "suppressed", black_box(42)));
    });

    group.bench_function("threshold_read", |b| {
        b.iter(|| black_box(log.threshold()));
    });

    group.finish();
}

// ============================================================================
// Emission Benchmarks
// ============================================================================

fn bench_emission(c: &mut Criterion) {
    let mut group = c.benchmark_group("emission");
    group.throughput(Throughput::Elements(1));

    let log = discard_handle("network");

    group.bench_function("always_to_sink", |b| {
        b.iter(|| log.log_always(black_box("Info message")));
    });

    group.bench_function("macro_three_args", |b| {
        b.iter(|| log_state!(log, "read", black_box(512), "bytes"));
    });

    let temp_dir = TempDir::new().unwrap();
    let manager = Arc::new(SinkManager::new(
        SinkConfig::new()
            .with_fallback_dir(temp_dir.path())
            .with_program_name("bench")
            .with_privileged(false),
    ));
    let file_log = LoggerHandle::builder("file")
        .level("network")
        .manager(manager)
        .build()
        .unwrap();

    group.bench_function("always_to_rotating_file", |b| {
        b.iter(|| file_log.log_always(black_box("File message")));
    });

    group.finish();
}

fn bench_concurrent_emission(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_emission");

    for threads in [2, 4, 8] {
        group.throughput(Throughput::Elements(threads * 1_000));
        group.bench_function(format!("{}_threads", threads), |b| {
            let log = Arc::new(discard_handle("network"));
            b.iter(|| {
                let workers: Vec<_> = (0..threads)
                    .map(|_| {
                        let log = Arc::clone(&log);
                        thread::spawn(move || {
                            for i in 0..1_000 {
                                log.log_always(i);
                            }
                        })
                    })
                    .collect();
                for worker in workers {
                    worker.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

// ============================================================================
// Adaptive Sampling Benchmarks
// ============================================================================

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");
    group.throughput(Throughput::Elements(1));

    let sampler = AdaptiveSampler::new(SamplingConfig::default());
    group.bench_function("admit", |b| {
        b.iter(|| black_box(sampler.admit()));
    });

    group.bench_function("emit_probability", |b| {
        b.iter(|| black_box(emit_probability(black_box(1_000_000))));
    });

    let log = discard_handle("network");
    group.bench_function("log_adaptive", |b| {
        b.iter(|| log.log_adaptive(black_box("packet")));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_level_gating,
    bench_emission,
    bench_concurrent_emission,
    bench_sampling
);

criterion_main!(benches);
