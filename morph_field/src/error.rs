//! Configuration errors for the particle field.

use thiserror::Error;

/// Rejected configuration values.
///
/// These are raised while validating input, before anything reaches the
/// shape generator or the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Shape identifier outside the six supported shapes.
    #[error("unknown shape '{0}' (expected sphere, cube, heart, bottle, torus or star)")]
    UnknownShape(String),

    /// Particle count outside the supported range.
    #[error("particle count {count} outside {min}..={max}")]
    CountOutOfRange { count: usize, min: usize, max: usize },

    /// Gesture state label not recognised.
    #[error("unknown gesture state '{0}' (expected open, closed or none)")]
    UnknownGesture(String),
}
