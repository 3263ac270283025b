//! Whole-pipeline scenarios: gesture cell → smoother → field.

use std::f32::consts::TAU;

use morph_field::{
    generate, FrameTime, GestureCell, GestureState, Oscillation, ParticleField, Shape,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const DT: f32 = 1.0 / 60.0;

#[test]
fn three_point_sphere_then_closed_fist() {
    let buf = generate(Shape::Sphere, 3, &mut StdRng::seed_from_u64(0));
    assert_eq!(buf.len(), 9);

    let mut azimuths = Vec::new();
    for p in buf.chunks_exact(3) {
        let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        assert!((r - 10.0).abs() < 1e-4);
        azimuths.push(p[0].atan2(p[2]).rem_euclid(TAU));
    }
    for i in 0..3 {
        for j in (i + 1)..3 {
            assert!((azimuths[i] - azimuths[j]).abs() > 1e-3, "{:?}", azimuths);
        }
    }

    let cell = GestureCell::default();
    let mut field = ParticleField::seeded(Shape::Sphere, 3, 0);
    cell.store(GestureState::Closed);

    for frame in 0..50 {
        field.step(FrameTime::new(frame as f32 * DT, DT), cell.load());
    }
    // 0.4 + 0.6 · 0.95⁵⁰
    assert!((field.expansion() - 0.446).abs() < 0.001, "{}", field.expansion());

    for frame in 50..90 {
        field.step(FrameTime::new(frame as f32 * DT, DT), cell.load());
    }
    assert!((field.expansion() - 0.4).abs() < 0.01);
}

#[test]
fn gesture_flip_mid_run_reverses_expansion() {
    let cell = GestureCell::default();
    let mut field = ParticleField::seeded(Shape::Torus, 5_000, 11);

    cell.store(GestureState::Open);
    for frame in 0..60 {
        field.step(FrameTime::new(frame as f32 * DT, DT), cell.load());
    }
    let peak = field.expansion();
    assert!(peak > 2.0);

    cell.store(GestureState::Closed);
    let mut prev = peak;
    for frame in 60..120 {
        field.step(FrameTime::new(frame as f32 * DT, DT), cell.load());
        assert!(field.expansion() <= prev);
        prev = field.expansion();
    }
    assert!(prev < 1.0);
}

#[test]
fn morph_through_every_shape_without_reset() {
    let mut field = ParticleField::seeded(Shape::Sphere, 5_000, 21)
        .with_oscillation(Oscillation::still());
    let mut t = 0.0;
    for shape in Shape::ALL.into_iter().skip(1) {
        for _ in 0..30 {
            t += DT;
            field.step(FrameTime::new(t, DT), GestureState::NoHand);
        }
        let snapshot = field.live().to_vec();
        field.set_shape(shape);
        assert_eq!(field.live(), &snapshot[..], "live reset switching to {}", shape);
    }
    assert!(field.live().iter().all(|v| v.is_finite()));
}
