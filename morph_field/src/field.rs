//! The particle field: live positions pursuing an expanded target field.
//!
//! Every frame each particle moves a fixed fraction of the way toward
//! `target × expansion + oscillation`.  The target itself drifts (expansion
//! eases, the oscillation term evolves), so the cloud is always chasing a
//! moving goal, which is what makes shape morphs and gesture
//! scatter/condense read as smooth motion rather than jumps.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::gesture::GestureState;
use crate::lerp;
use crate::shape::{generate, Shape};
use crate::smoother::{ExpansionSmoother, Smoothing};

/// Ambient spin of the whole cloud about the vertical axis, rad/s.
pub const ROTATION_RATE: f32 = 0.05;

const SIZE_MIN: f32 = 0.5;
const SIZE_MAX: f32 = 2.5;

// ════════════════════════════════════════════════════════════════════════════
// FrameTime
// ════════════════════════════════════════════════════════════════════════════

/// Clock readings for one rendered frame.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the animation started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta:   f32,
}

impl FrameTime {
    pub fn new(elapsed: f32, delta: f32) -> Self {
        FrameTime { elapsed, delta }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Oscillation
// ════════════════════════════════════════════════════════════════════════════

/// Per-particle wobble added to every target.
///
/// The phase uses the raw particle index, so neighbouring indices are a full
/// radian apart and the pattern aliases visibly at high counts.  That
/// shimmer is part of the look; `index_phase` scales it if a calmer texture
/// is wanted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oscillation {
    pub amplitude:   f32,
    pub index_phase: f32,
}

impl Oscillation {
    /// No wobble at all.
    pub const fn still() -> Self {
        Oscillation { amplitude: 0.0, index_phase: 1.0 }
    }

    /// Offset of particle `i` at time `t`.
    #[inline]
    pub fn offset(&self, i: f32, t: f32) -> [f32; 3] {
        if self.amplitude == 0.0 {
            return [0.0; 3];
        }
        let k = i * self.index_phase;
        [
            (t + k).sin() * self.amplitude,
            (t + k * 0.5).cos() * self.amplitude,
            (t * 0.5 + k).sin() * self.amplitude,
        ]
    }
}

impl Default for Oscillation {
    fn default() -> Self {
        Oscillation { amplitude: 0.1, index_phase: 1.0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// advance: the per-frame pursuit
// ════════════════════════════════════════════════════════════════════════════

/// Move every live point a fraction `alpha` toward its expanded,
/// oscillating target.
///
/// # Panics
///
/// If `live` and `targets` differ in length.  That can only come from a
/// broken reconfiguration sequence and is not recoverable.
pub fn advance(
    live:        &mut [f32],
    targets:     &[f32],
    expansion:   f32,
    elapsed:     f32,
    alpha:       f32,
    oscillation: &Oscillation,
) {
    assert_eq!(live.len(), targets.len(), "live and target buffers out of step");

    for (i, (p, t)) in live.chunks_exact_mut(3).zip(targets.chunks_exact(3)).enumerate() {
        let [ox, oy, oz] = oscillation.offset(i as f32, elapsed);
        p[0] = lerp(p[0], t[0] * expansion + ox, alpha);
        p[1] = lerp(p[1], t[1] * expansion + oy, alpha);
        p[2] = lerp(p[2], t[2] * expansion + oz, alpha);
    }
}

fn draw_sizes(count: usize, rng: &mut StdRng) -> Vec<f32> {
    (0..count).map(|_| rng.random_range(SIZE_MIN..SIZE_MAX)).collect()
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleField
// ════════════════════════════════════════════════════════════════════════════

/// Owns the live, target and size buffers plus the expansion state.
///
/// Buffers are sized once per configuration and reused frame after frame;
/// [`ParticleField::step`] never allocates.
pub struct ParticleField {
    shape:       Shape,
    live:        Vec<f32>,
    targets:     Vec<f32>,
    sizes:       Vec<f32>,
    expansion:   ExpansionSmoother,
    pursuit:     Smoothing,
    oscillation: Oscillation,
    rotation_y:  f32,
    rng:         StdRng,
}

impl ParticleField {
    /// Field seeded from the operating system.
    pub fn new(shape: Shape, count: usize) -> Self {
        Self::with_rng(shape, count, StdRng::from_os_rng())
    }

    /// Field whose random shapes and sizes are reproducible from `seed`.
    pub fn seeded(shape: Shape, count: usize, seed: u64) -> Self {
        Self::with_rng(shape, count, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(shape: Shape, count: usize, mut rng: StdRng) -> Self {
        let targets = generate(shape, count, &mut rng);
        let sizes = draw_sizes(count, &mut rng);
        ParticleField {
            shape,
            live: vec![0.0; count * 3],
            targets,
            sizes,
            expansion: ExpansionSmoother::default(),
            pursuit: Smoothing::default(),
            oscillation: Oscillation::default(),
            rotation_y: 0.0,
            rng,
        }
    }

    /// Use `smoothing` for both the expansion scalar and the particle
    /// pursuit.
    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.pursuit = smoothing;
        self.expansion.set_smoothing(smoothing);
        self
    }

    pub fn with_oscillation(mut self, oscillation: Oscillation) -> Self {
        self.oscillation = oscillation;
        self
    }

    // ── per-frame update ──────────────────────────────────────────────────

    /// Advance one rendered frame using the latest gesture.
    pub fn step(&mut self, frame: FrameTime, gesture: GestureState) {
        if self.live.is_empty() {
            return;
        }
        assert_eq!(self.sizes.len() * 3, self.live.len(), "size buffer out of step");

        let e = self.expansion.update(gesture, frame.delta);
        let alpha = self.pursuit.factor(frame.delta);
        advance(&mut self.live, &self.targets, e, frame.elapsed, alpha, &self.oscillation);
        self.rotation_y = frame.elapsed * ROTATION_RATE;
    }

    // ── reconfiguration ───────────────────────────────────────────────────

    /// Switch to a new shape.  Only the target buffer is replaced; live
    /// positions carry over so the cloud morphs instead of resetting.
    /// Returns `false` if `shape` was already active.
    pub fn set_shape(&mut self, shape: Shape) -> bool {
        if shape == self.shape {
            return false;
        }
        self.targets = generate(shape, self.len(), &mut self.rng);
        self.shape = shape;
        debug!("field: shape -> {} ({} particles)", shape, self.len());
        true
    }

    /// Resize to `count` particles.  Targets and sizes are regenerated, the
    /// live positions of surviving particles are kept and new particles
    /// start at the origin.  All three buffers are swapped in together.
    /// Returns `false` if the count was unchanged.
    pub fn set_count(&mut self, count: usize) -> bool {
        if count == self.len() {
            return false;
        }
        let targets = generate(self.shape, count, &mut self.rng);
        let sizes = draw_sizes(count, &mut self.rng);
        let mut live = std::mem::take(&mut self.live);
        live.resize(count * 3, 0.0);

        self.live = live;
        self.targets = targets;
        self.sizes = sizes;
        debug!("field: resized to {} particles ({})", count, self.shape);
        true
    }

    // ── accessors ─────────────────────────────────────────────────────────

    /// Number of particles.
    pub fn len(&self) -> usize { self.sizes.len() }

    pub fn is_empty(&self) -> bool { self.sizes.is_empty() }

    pub fn shape(&self) -> Shape { self.shape }

    /// Current rendered positions, `x, y, z` per particle.
    pub fn live(&self) -> &[f32] { &self.live }

    /// Target field for the active shape and count.
    pub fn targets(&self) -> &[f32] { &self.targets }

    /// Per-particle point sizes in `[0.5, 2.5)`.
    pub fn sizes(&self) -> &[f32] { &self.sizes }

    /// Current smoothed expansion factor.
    pub fn expansion(&self) -> f32 { self.expansion.value() }

    /// Rotation of the whole cloud about the vertical axis, radians.
    pub fn rotation_y(&self) -> f32 { self.rotation_y }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn max_gap(field: &ParticleField) -> f32 {
        field
            .live()
            .chunks_exact(3)
            .zip(field.targets().chunks_exact(3))
            .map(|(p, t)| {
                let d = [p[0] - t[0], p[1] - t[1], p[2] - t[2]];
                (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
            })
            .fold(0.0, f32::max)
    }

    fn still_field(shape: Shape, count: usize) -> ParticleField {
        ParticleField::seeded(shape, count, 42).with_oscillation(Oscillation::still())
    }

    #[test]
    fn buffers_share_one_count() {
        let f = ParticleField::seeded(Shape::Heart, 5_000, 1);
        assert_eq!(f.len(), 5_000);
        assert_eq!(f.live().len(), 15_000);
        assert_eq!(f.targets().len(), 15_000);
        assert!(f.live().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn sizes_drawn_in_range() {
        let f = ParticleField::seeded(Shape::Cube, 5_000, 3);
        assert!(f.sizes().iter().all(|s| (0.5..2.5).contains(s)));
    }

    #[test]
    fn pursuit_converges_monotonically() {
        let mut f = still_field(Shape::Sphere, 2_000);
        let mut prev = max_gap(&f);
        for _ in 0..200 {
            f.step(FrameTime::new(1.0, DT), GestureState::NoHand);
            let gap = max_gap(&f);
            assert!(gap <= prev, "{} > {}", gap, prev);
            prev = gap;
        }
        assert_eq!(f.expansion(), 1.0);
        assert!(prev < 1e-3, "gap after 200 frames {}", prev);
    }

    #[test]
    fn shape_change_keeps_live_then_converges() {
        let mut f = still_field(Shape::Sphere, 3_000);
        for _ in 0..40 {
            f.step(FrameTime::new(0.0, DT), GestureState::NoHand);
        }
        let before = f.live().to_vec();
        let old_targets = f.targets().to_vec();

        assert!(f.set_shape(Shape::Torus));
        assert_eq!(f.live(), &before[..]);
        assert_ne!(f.targets(), &old_targets[..]);

        let gap_at_switch = max_gap(&f);
        for _ in 0..200 {
            f.step(FrameTime::new(0.0, DT), GestureState::NoHand);
        }
        assert!(max_gap(&f) < gap_at_switch * 1e-3);
    }

    #[test]
    fn same_shape_is_not_regenerated() {
        let mut f = ParticleField::seeded(Shape::Star, 5_000, 5);
        let targets = f.targets().to_vec();
        assert!(!f.set_shape(Shape::Star));
        assert_eq!(f.targets(), &targets[..]);
    }

    #[test]
    fn count_change_resizes_all_buffers_and_keeps_prefix() {
        let mut f = still_field(Shape::Sphere, 6_000);
        for _ in 0..10 {
            f.step(FrameTime::new(0.0, DT), GestureState::NoHand);
        }
        let prefix = f.live()[..5_000 * 3].to_vec();

        assert!(f.set_count(5_000));
        assert_eq!(f.len(), 5_000);
        assert_eq!(f.sizes().len(), 5_000);
        assert_eq!(f.targets().len(), 15_000);
        assert_eq!(f.live(), &prefix[..]);

        assert!(f.set_count(7_000));
        assert_eq!(f.live().len(), 21_000);
        assert!(f.live()[15_000..].iter().all(|&v| v == 0.0));
        assert!(!f.set_count(7_000));
    }

    #[test]
    fn empty_field_step_is_noop() {
        let mut f = ParticleField::seeded(Shape::Sphere, 0, 1);
        f.step(FrameTime::new(3.0, DT), GestureState::Open);
        assert!(f.is_empty());
        assert_eq!(f.expansion(), 1.0);
        assert_eq!(f.rotation_y(), 0.0);
    }

    #[test]
    fn open_hand_scatters_cloud() {
        let mut f = ParticleField::seeded(Shape::Sphere, 5_000, 2);
        for frame in 0..400 {
            f.step(FrameTime::new(frame as f32 * DT, DT), GestureState::Open);
        }
        let mean_radius: f32 = f
            .live()
            .chunks_exact(3)
            .map(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt())
            .sum::<f32>()
            / f.len() as f32;
        assert!((mean_radius - 25.0).abs() < 0.5, "mean radius {}", mean_radius);
    }

    #[test]
    fn rotation_tracks_elapsed_time() {
        let mut f = ParticleField::seeded(Shape::Cube, 5_000, 2);
        f.step(FrameTime::new(10.0, DT), GestureState::NoHand);
        assert!((f.rotation_y() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn default_oscillation_terms() {
        let o = Oscillation::default();
        let [x, y, z] = o.offset(0.0, 0.0);
        assert_eq!(x, 0.0);
        assert!((y - 0.1).abs() < 1e-7);
        assert_eq!(z, 0.0);
        let [x, _, _] = o.offset(2.0, 1.0);
        assert!((x - 3.0_f32.sin() * 0.1).abs() < 1e-6);
        assert_eq!(Oscillation::still().offset(7.0, 3.0), [0.0; 3]);
    }

    #[test]
    #[should_panic(expected = "out of step")]
    fn mismatched_buffers_are_fatal() {
        let mut live = vec![0.0; 6];
        advance(&mut live, &[1.0; 9], 1.0, 0.0, 0.05, &Oscillation::default());
    }
}
