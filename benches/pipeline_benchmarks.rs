//! Performance benchmarks for the admission pipeline.
//!
//! Tracks the hot path every delivery takes:
//! - Full pipeline run for push payloads of increasing size
//! - HMAC verification alone
//! - Sensitive scanning and sanitization of the raw body

use std::{hint::black_box, sync::Arc, time::Duration};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hookgate_core::{NoOpSink, PayloadNode};
use hookgate_pipeline::{EventDispatcher, ValidationPipeline};
use hookgate_security::{PolicyConfig, SecurityPolicy};
use hookgate_testing::{fixtures, test_verifier, DeliveryBuilder};
use serde_json::{json, Value};

const COMMIT_COUNTS: [usize; 4] = [1, 10, 100, 1000];

fn push_with(commit_count: usize) -> Value {
    let commits = (0..commit_count)
        .map(|i| {
            fixtures::commit(
                &format!("deadbeef{i:x}"),
                &format!("Refactor module {i} for clarity"),
                &["src/lib.rs"],
                &["README.md"],
            )
        })
        .collect();
    fixtures::push_with_commits(commits)
}

fn build_pipeline() -> ValidationPipeline {
    let policy = SecurityPolicy::new(PolicyConfig::default()).expect("default policy builds");
    ValidationPipeline::new(
        Arc::new(policy),
        test_verifier(),
        Arc::new(EventDispatcher::with_default_handlers()),
        Arc::new(NoOpSink),
    )
}

/// Benchmarks a full admission for different payload sizes.
fn bench_pipeline_run(c: &mut Criterion) {
    let pipeline = build_pipeline();

    let mut group = c.benchmark_group("pipeline");
    group.measurement_time(Duration::from_secs(10));

    for commit_count in COMMIT_COUNTS {
        let request = DeliveryBuilder::new("push", &push_with(commit_count)).build();
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("push_commits", commit_count),
            &request,
            |b, request| {
                b.iter(|| {
                    let outcome = pipeline.run(black_box(request));
                    assert!(outcome.verdict.is_admitted());
                });
            },
        );
    }

    group.finish();
}

/// Benchmarks the rejection path for a bad signature.
fn bench_rejection(c: &mut Criterion) {
    let pipeline = build_pipeline();
    let request = DeliveryBuilder::new("push", &fixtures::push_payload())
        .signature(format!("sha256={}", "0".repeat(64)))
        .build();

    c.bench_function("pipeline/reject_signature", |b| {
        b.iter(|| pipeline.run(black_box(&request)));
    });
}

/// Benchmarks scanning and sanitization against raw body size.
fn bench_content_checks(c: &mut Criterion) {
    let policy = SecurityPolicy::new(PolicyConfig::default()).expect("default policy builds");

    let mut group = c.benchmark_group("content");
    for commit_count in COMMIT_COUNTS {
        let mut payload = push_with(commit_count);
        payload["description"] = json!("<script>alert(1)</script> javascript:void(0)");
        let body = serde_json::to_vec(&payload).expect("payload serializes");
        let text = String::from_utf8_lossy(&body).into_owned();
        let node = PayloadNode::parse(&body, 64).expect("payload parses");

        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::new("scan", commit_count), &text, |b, text| {
            b.iter(|| policy.scanner().scan(black_box(text)));
        });
        group.bench_with_input(BenchmarkId::new("sanitize", commit_count), &node, |b, node| {
            b.iter(|| policy.sanitizer().sanitize(black_box(node)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline_run, bench_rejection, bench_content_checks);
criterion_main!(benches);
