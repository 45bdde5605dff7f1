//! # Control Step Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use smc_lib::{
    dynamics::{DynamicsEngine, DynamicsParams, DynamicsVariant},
    gain_validator::SmcKind,
    smc_ctrl::{SmcCtrl, SmcParams},
    StateVector,
};

fn control_step_benchmark(c: &mut Criterion) {
    let state = StateVector::new(0.05, -0.1, 0.1, 0.2, 0.05, -0.3);

    // ---- Controllers ----

    let classical = SmcCtrl::new(SmcParams::default()).unwrap();
    let classical_mem = classical.initial_memory();

    c.bench_function("SmcCtrl::compute_control::classical", |b| {
        b.iter(|| classical.compute_control(black_box(&state), &classical_mem).unwrap())
    });

    let hybrid = SmcCtrl::new(SmcParams {
        kind: SmcKind::Hybrid,
        gains: vec![5.0, 10.0, 3.0, 8.0],
        ..Default::default()
    })
    .unwrap();
    let hybrid_mem = hybrid.initial_memory();

    c.bench_function("SmcCtrl::compute_control::hybrid", |b| {
        b.iter(|| hybrid.compute_control(black_box(&state), &hybrid_mem).unwrap())
    });

    // ---- Dynamics ----

    let simplified = DynamicsEngine::new(DynamicsParams::default()).unwrap();
    let full = DynamicsEngine::new(DynamicsParams {
        variant: DynamicsVariant::Full,
        ..Default::default()
    })
    .unwrap();

    c.bench_function("DynamicsEngine::step_rk4::simplified", |b| {
        b.iter(|| simplified.step_rk4(black_box(&state), 1.0, 0.001).unwrap())
    });
    c.bench_function("DynamicsEngine::step_rk4::full", |b| {
        b.iter(|| full.step_rk4(black_box(&state), 1.0, 0.001).unwrap())
    });

    let mut cached = full.clone();
    cached.enable_cache();

    c.bench_function("DynamicsEngine::get_matrices::cached", |b| {
        b.iter(|| cached.get_matrices(black_box(&state)))
    });
}

criterion_group!(benches, control_step_benchmark);
criterion_main!(benches);
