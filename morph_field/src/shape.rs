//! Procedural target fields.
//!
//! [`generate`] maps a [`Shape`] and a particle count to a flat buffer of
//! `count * 3` floats (`x, y, z` per particle).  The sphere is a
//! deterministic even spiral; every other shape samples from the supplied
//! random source, so callers that need reproducible output pass a seeded
//! RNG.

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::ConfigError;

// ════════════════════════════════════════════════════════════════════════════
// Shape
// ════════════════════════════════════════════════════════════════════════════

/// The six supported target shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Shape {
    #[default]
    Sphere,
    Cube,
    Heart,
    Bottle,
    Torus,
    Star,
}

impl Shape {
    /// All shapes in control-panel order.
    pub const ALL: [Shape; 6] = [
        Shape::Sphere,
        Shape::Cube,
        Shape::Heart,
        Shape::Bottle,
        Shape::Torus,
        Shape::Star,
    ];

    /// Identifier used in configuration (`"sphere"`, `"cube"`, …).
    pub fn name(self) -> &'static str {
        match self {
            Shape::Sphere => "sphere",
            Shape::Cube   => "cube",
            Shape::Heart  => "heart",
            Shape::Bottle => "bottle",
            Shape::Torus  => "torus",
            Shape::Star   => "star",
        }
    }

    /// Human-readable label for the control panel.
    pub fn label(self) -> &'static str {
        match self {
            Shape::Sphere => "Sphere",
            Shape::Cube   => "Cube",
            Shape::Heart  => "Heart",
            Shape::Bottle => "Bottle",
            Shape::Torus  => "Torus",
            Shape::Star   => "Star",
        }
    }

    /// Whether [`generate`] draws from the random source for this shape.
    pub fn is_stochastic(self) -> bool {
        !matches!(self, Shape::Sphere)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shape {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Shape::ALL
            .into_iter()
            .find(|shape| shape.name() == key)
            .ok_or_else(|| ConfigError::UnknownShape(s.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Shape constants
// ════════════════════════════════════════════════════════════════════════════

const SPHERE_RADIUS:      f32 = 10.0;
const CUBE_HALF_EXTENT:   f32 = 8.0;
const HEART_SCALE:        f32 = 0.6;
const HEART_DEPTH:        f32 = 2.5;
const BOTTLE_HEIGHT:      f32 = 20.0;
const BOTTLE_BODY_RADIUS: f32 = 4.0;
const BOTTLE_NECK_RADIUS: f32 = 1.0;
const BOTTLE_SHOULDER:    f32 = 0.6;
const BOTTLE_NECK:        f32 = 0.8;
const TORUS_MAJOR:        f32 = 8.0;
const TORUS_MINOR:        f32 = 3.0;
const STAR_OUTER:         f32 = 10.0;
const STAR_INNER:         f32 = 4.0;
const STAR_DEPTH:         f32 = 1.0;

// ════════════════════════════════════════════════════════════════════════════
// generate
// ════════════════════════════════════════════════════════════════════════════

/// Produce the target field for `shape` with `count` particles.
///
/// The returned buffer has exactly `count * 3` finite values.
pub fn generate<R: Rng + ?Sized>(shape: Shape, count: usize, rng: &mut R) -> Vec<f32> {
    let mut out = vec![0.0_f32; count * 3];
    for (i, point) in out.chunks_exact_mut(3).enumerate() {
        let [x, y, z] = match shape {
            Shape::Sphere => sphere_point(i, count),
            Shape::Cube   => cube_point(rng),
            Shape::Heart  => heart_point(rng),
            Shape::Bottle => bottle_point(rng),
            Shape::Torus  => torus_point(rng),
            Shape::Star   => star_point(i, rng),
        };
        point[0] = x;
        point[1] = y;
        point[2] = z;
    }
    out
}

/// Even spiral over the sphere surface; no randomness.
fn sphere_point(i: usize, count: usize) -> [f32; 3] {
    let n = count as f32;
    let phi = (-1.0 + 2.0 * i as f32 / n).clamp(-1.0, 1.0).acos();
    let theta = (n * PI).sqrt() * phi;
    from_spherical(SPHERE_RADIUS, phi, theta)
}

/// Spherical → Cartesian with `y` as the polar axis.
fn from_spherical(radius: f32, phi: f32, theta: f32) -> [f32; 3] {
    let ring = radius * phi.sin();
    [ring * theta.sin(), radius * phi.cos(), ring * theta.cos()]
}

fn cube_point<R: Rng + ?Sized>(rng: &mut R) -> [f32; 3] {
    let e = CUBE_HALF_EXTENT;
    [
        rng.random_range(-e..e),
        rng.random_range(-e..e),
        rng.random_range(-e..e),
    ]
}

fn heart_point<R: Rng + ?Sized>(rng: &mut R) -> [f32; 3] {
    let t = rng.random_range(0.0..TAU);
    let x = 16.0 * t.sin().powi(3);
    let y = 13.0 * t.cos()
        - 5.0 * (2.0 * t).cos()
        - 2.0 * (3.0 * t).cos()
        - (4.0 * t).cos();
    let z = rng.random_range(-HEART_DEPTH..HEART_DEPTH);
    [x * HEART_SCALE, y * HEART_SCALE, z]
}

/// Radius of the bottle shell at normalised height `h`.
fn bottle_radius(h: f32) -> f32 {
    if h < BOTTLE_SHOULDER {
        BOTTLE_BODY_RADIUS
    } else if h < BOTTLE_NECK {
        let local = (h - BOTTLE_SHOULDER) / (BOTTLE_NECK - BOTTLE_SHOULDER);
        BOTTLE_BODY_RADIUS - local * (BOTTLE_BODY_RADIUS - BOTTLE_NECK_RADIUS)
    } else {
        BOTTLE_NECK_RADIUS
    }
}

fn bottle_point<R: Rng + ?Sized>(rng: &mut R) -> [f32; 3] {
    let h: f32 = rng.random();
    let radius = bottle_radius(h);
    let angle = rng.random_range(0.0..TAU);
    [
        angle.cos() * radius,
        (h - 0.5) * BOTTLE_HEIGHT,
        angle.sin() * radius,
    ]
}

fn torus_point<R: Rng + ?Sized>(rng: &mut R) -> [f32; 3] {
    let u = rng.random_range(0.0..TAU);
    let v = rng.random_range(0.0..TAU);
    let tube = TORUS_MAJOR + TORUS_MINOR * v.cos();
    [tube * u.cos(), tube * u.sin(), TORUS_MINOR * v.sin()]
}

/// Outline approximation: even indices sit on the outer radius, odd on the
/// inner one, each jittered by ±20 %.
fn star_point<R: Rng + ?Sized>(i: usize, rng: &mut R) -> [f32; 3] {
    let angle = rng.random_range(0.0..TAU);
    let base = if i % 2 == 0 { STAR_OUTER } else { STAR_INNER };
    let r = base * rng.random_range(0.8..1.2);
    [
        angle.cos() * r,
        angle.sin() * r,
        rng.random_range(-STAR_DEPTH..STAR_DEPTH),
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
