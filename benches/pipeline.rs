//! Benchmarks for the capsule assembly pipeline.

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use imm_capsule::capsule::CapsuleRecord;
use imm_capsule::capsule::Signals;
use imm_capsule::capsule::config::CapsuleConfig;
use imm_capsule::cnf::CnfFormula;
use imm_capsule::entropy;
use imm_capsule::provenance::{series_text, sha256_hex};

fn drift_window() -> Vec<f64> {
    (0..21).map(|i| 1.0 + (i as f64 * 0.37).sin() * 0.05).collect()
}

fn motifs(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("m{i}")).collect()
}

fn bench_entropy_delta(c: &mut Criterion) {
    let drift = drift_window();
    c.bench_function("entropy_delta_21", |bench| {
        bench.iter(|| black_box(entropy::delta(black_box(&drift))))
    });
}

fn bench_motif_cnf(c: &mut Criterion) {
    let trail = motifs(256);
    c.bench_function("motif_cnf_256", |bench| {
        bench.iter(|| black_box(CnfFormula::from_motifs(black_box(&trail))))
    });
}

fn bench_series_hash(c: &mut Criterion) {
    let drift = drift_window();
    c.bench_function("series_sha256_21", |bench| {
        bench.iter(|| black_box(sha256_hex(&series_text(black_box(&drift)))))
    });
}

fn bench_assemble(c: &mut Criterion) {
    let config = CapsuleConfig::default();
    let drift = drift_window();
    let trail = motifs(12);
    let now = Utc.with_ymd_and_hms(2025, 3, 7, 14, 5, 0).unwrap();
    c.bench_function("assemble_record", |bench| {
        bench.iter(|| {
            black_box(CapsuleRecord::assemble(
                &config,
                Signals::default(),
                &drift,
                &trail,
                now,
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_entropy_delta,
    bench_motif_cnf,
    bench_series_hash,
    bench_assemble
);
criterion_main!(benches);
