// benches/error_performance.rs
//! Benchmarks for tagged_errors hot paths
//!
//! Covers error construction, identity checks across type depths, tag
//! interning, log formatting, reporting and outcome classification.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;
use tagged_errors::logging::ErrorLog;
use tagged_errors::{
    AppErrorOptions, AttemptFailure, BASE_ERROR, CommonErrorParams, Either, ErrorReport,
    ErrorReporter, ErrorType, InternalError, InternalErrorParams, OutcomePolicy, PublicError,
    RequestClassifier, Response, RetryPolicy, RingBufferReporter, TaggedError, define_errors,
    has_type, intern_tag, is_internal_error, is_public_error,
};

define_errors! {
    NotFound, public => {
        BENCH_NOT_FOUND => BENCH_NOT_FOUND_ERROR,
    }
}

static LEVEL_1: ErrorType = ErrorType::child("Level1", &BASE_ERROR);
static LEVEL_2: ErrorType = ErrorType::child("Level2", &LEVEL_1);
static LEVEL_3: ErrorType = ErrorType::child("Level3", &LEVEL_2);
static LEVEL_4: ErrorType = ErrorType::child("Level4", &LEVEL_3);
static LEVEL_5: ErrorType = ErrorType::child("Level5", &LEVEL_4);
static UNRELATED: ErrorType = ErrorType::child("Unrelated", &BASE_ERROR);

// ============================================================================
// CREATION BENCHMARKS
// ============================================================================

fn bench_error_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("error_constructors");

    group.bench_function("internal", |b| {
        b.iter(|| black_box(InternalError::new(InternalErrorParams::new("db down", "DB_DOWN"))))
    });

    group.bench_function("internal_with_details", |b| {
        b.iter(|| {
            black_box(InternalError::new(
                InternalErrorParams::new("db down", "DB_DOWN").details(json!({ "shard": 3 })),
            ))
        })
    });

    group.bench_function("entity_gone", |b| {
        b.iter(|| black_box(PublicError::entity_gone(CommonErrorParams::new("gone"))))
    });

    group.bench_function("app_error", |b| {
        b.iter(|| black_box(BENCH_NOT_FOUND_ERROR.new(AppErrorOptions::new("missing"))))
    });

    group.bench_function("dynamic_message", |b| {
        b.iter(|| {
            let message = format!("shard {} unreachable", black_box(42));
            black_box(InternalError::new(InternalErrorParams::new(message, "SHARD_DOWN")))
        })
    });

    group.finish();
}

// ============================================================================
// IDENTITY BENCHMARKS
// ============================================================================

fn bench_has_type_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("has_type_depth");
    let err = TaggedError::new(&LEVEL_5, "DEEP", "deep");
    let levels: [(usize, &ErrorType); 5] = [
        (1, &LEVEL_1),
        (2, &LEVEL_2),
        (3, &LEVEL_3),
        (4, &LEVEL_4),
        (5, &LEVEL_5),
    ];

    for (depth, ty) in levels {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &ty, |b, ty| {
            b.iter(|| black_box(has_type(&err, ty)))
        });
    }

    group.bench_function("miss", |b| b.iter(|| black_box(has_type(&err, &UNRELATED))));
    group.finish();
}

fn bench_guards(c: &mut Criterion) {
    let internal = InternalError::new(InternalErrorParams::new("x", "X"));
    let public = PublicError::entity_gone(CommonErrorParams::new("gone"));

    c.bench_function("guard_internal_hit", |b| {
        b.iter(|| black_box(is_internal_error(black_box(&internal))))
    });
    c.bench_function("guard_public_miss", |b| {
        b.iter(|| black_box(is_public_error(black_box(&internal))))
    });
    c.bench_function("guard_public_hit", |b| {
        b.iter(|| black_box(is_public_error(black_box(&public))))
    });
}

fn bench_interning(c: &mut Criterion) {
    intern_tag("BaseError.Bench.Existing");

    c.bench_function("intern_existing", |b| {
        b.iter(|| black_box(intern_tag(black_box("BaseError.Bench.Existing"))))
    });
}

// ============================================================================
// LOGGING BENCHMARKS
// ============================================================================

fn bench_log_truncation(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_truncation");

    for size in [100, 1024, 5000, 10000] {
        let err = InternalError::new(InternalErrorParams::new("A".repeat(size), "BIG"));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut buffer = String::new();
                ErrorLog::from_error(&err).write_to(&mut buffer).unwrap();
                black_box(buffer)
            })
        });
    }

    group.finish();
}

fn bench_ring_buffer(c: &mut Criterion) {
    let reporter = RingBufferReporter::new(256, 512);
    let err = InternalError::new(InternalErrorParams::new("db down", "DB_DOWN"));

    c.bench_function("ring_buffer_report", |b| {
        b.iter(|| reporter.report(black_box(&ErrorReport::new(&err))))
    });
}

// ============================================================================
// CLASSIFIER BENCHMARKS
// ============================================================================

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let lenient = RequestClassifier::new(
        RetryPolicy::no_retry(),
        OutcomePolicy::default().throw_on_error(false),
    );
    let strict = RequestClassifier::default();

    group.bench_function("success", |b| {
        b.iter(|| {
            black_box(lenient.classify(Either::Success(Response::new(200, json!({ "id": 1 })))))
        })
    });

    group.bench_function("failure_as_value", |b| {
        b.iter(|| black_box(lenient.classify(Either::Failure(AttemptFailure::timeout()))))
    });

    group.bench_function("failure_as_error", |b| {
        b.iter(|| {
            black_box(strict.classify(Either::Failure(AttemptFailure::status(502, json!(null)))))
        })
    });

    group.finish();
}

criterion_group!(creation_benches, bench_error_creation);

criterion_group!(identity_benches, bench_has_type_depth, bench_guards, bench_interning);

criterion_group!(logging_benches, bench_log_truncation, bench_ring_buffer);

criterion_group!(classifier_benches, bench_classify);

criterion_main!(
    creation_benches,
    identity_benches,
    logging_benches,
    classifier_benches,
);
