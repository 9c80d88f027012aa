//! # Stepper Benchmark
//!
//! Per-tick overhead of the accumulator around the engine: noise, force
//! clearing and drag re-application, with the fake engine doing near-zero
//! work per step.
//!
//! Run with: `cargo bench --package skytrace_core --features testing`

// Benchmarks don't need strict docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use skytrace_core::testing::MockEngine;
use skytrace_core::{
    BodyId, ControlNoise, InteractionController, PhysicsEngine, PhysicsStepper, PointerRay,
    SceneLayout,
};
use skytrace_shared::Vec3;

/// One render tick's worth of sub-steps, at several tick lengths.
fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("stepper_advance");

    for tick_ms in [8.0_f64, 16.0, 33.0] {
        group.bench_with_input(BenchmarkId::from_parameter(tick_ms), &tick_ms, |b, &tick_ms| {
            let mut engine = MockEngine::drone();
            let Ok(layout) = SceneLayout::build(engine.topology(), engine.state()) else {
                return;
            };
            let mut stepper = PhysicsStepper::default();
            let mut noise = ControlNoise::new(0.05, 0.1, 1);
            let mut drag = InteractionController::default();
            let ray = PointerRay::new(Vec3::new(0.5, 1.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
            drag.grab(engine.state(), BodyId(1), Vec3::new(0.0, 1.0, 0.0), ray);

            let mut now = 0.0;
            b.iter(|| {
                now += tick_ms;
                black_box(stepper.advance(&mut engine, &layout, now, &mut noise, &mut drag))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_advance);
criterion_main!(benches);
