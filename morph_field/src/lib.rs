//! # morph_field
//!
//! The particle animation engine behind Zenith Particles: procedural target
//! fields for six shapes, a smoothed "expansion" scalar driven by hand
//! gestures, and the per-frame pursuit that pulls tens of thousands of live
//! points toward `target × expansion`.
//!
//! ## Quick start
//!
//! ```rust
//! use morph_field::{FrameTime, GestureState, ParticleField, Shape};
//!
//! let mut field = ParticleField::seeded(Shape::Torus, 5_000, 7);
//! for frame in 0..120 {
//!     let t = frame as f32 / 60.0;
//!     field.step(FrameTime::new(t, 1.0 / 60.0), GestureState::Open);
//! }
//! assert!(field.expansion() > 1.0);
//! ```
//!
//! ## Layout
//!
//! | Module | Role |
//! |---|---|
//! | [`shape`] | `(shape, count) → flat target buffer` |
//! | [`gesture`] | discrete gesture state + single-slot shared cell |
//! | [`smoother`] | exponential smoothing of the expansion factor |
//! | [`field`] | live/target/size buffers and the per-frame update |
//! | [`count`] | validated particle count |

pub mod count;
pub mod field;
pub mod gesture;
pub mod shape;
pub mod smoother;

mod error;

pub use count::ParticleCount;
pub use error::ConfigError;
pub use field::{advance, FrameTime, Oscillation, ParticleField, ROTATION_RATE};
pub use gesture::{GestureCell, GestureState};
pub use shape::{generate, Shape};
pub use smoother::{ExpansionSmoother, Smoothing};

/// Linear interpolation: moves `a` toward `b` by the fraction `t`.
///
/// Written as `a + (b - a) * t` so that for `t` in `[0, 1]` the result never
/// lands past `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
