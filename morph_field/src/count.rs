//! Validated particle count.

use std::fmt;

use crate::error::ConfigError;

/// Number of particles in the cloud, always within
/// [`ParticleCount::MIN`]`..=`[`ParticleCount::MAX`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleCount(usize);

impl ParticleCount {
    pub const MIN:     usize = 5_000;
    pub const MAX:     usize = 30_000;
    /// Increment used by the control panel.
    pub const STEP:    usize = 1_000;
    pub const DEFAULT: usize = 15_000;

    /// Accept `n` only if it lies in range.
    pub fn new(n: usize) -> Result<Self, ConfigError> {
        if (Self::MIN..=Self::MAX).contains(&n) {
            Ok(ParticleCount(n))
        } else {
            Err(ConfigError::CountOutOfRange { count: n, min: Self::MIN, max: Self::MAX })
        }
    }

    /// Clamp `n` into range.
    pub fn clamped(n: usize) -> Self {
        ParticleCount(n.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> usize { self.0 }

    /// One panel step up, saturating at the maximum.
    pub fn step_up(self) -> Self {
        Self::clamped(self.0.saturating_add(Self::STEP))
    }

    /// One panel step down, saturating at the minimum.
    pub fn step_down(self) -> Self {
        Self::clamped(self.0.saturating_sub(Self::STEP))
    }
}

impl Default for ParticleCount {
    fn default() -> Self {
        ParticleCount(Self::DEFAULT)
    }
}

impl fmt::Display for ParticleCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_enforced() {
        assert!(ParticleCount::new(5_000).is_ok());
        assert!(ParticleCount::new(30_000).is_ok());
        assert_eq!(
            ParticleCount::new(4_999),
            Err(ConfigError::CountOutOfRange { count: 4_999, min: 5_000, max: 30_000 })
        );
        assert!(ParticleCount::new(30_001).is_err());
    }

    #[test]
    fn clamping() {
        assert_eq!(ParticleCount::clamped(0).get(), 5_000);
        assert_eq!(ParticleCount::clamped(99_999).get(), 30_000);
        assert_eq!(ParticleCount::clamped(12_345).get(), 12_345);
    }

    #[test]
    fn steps_saturate() {
        let top = ParticleCount::clamped(29_500);
        assert_eq!(top.step_up().get(), 30_000);
        assert_eq!(top.step_up().step_up().get(), 30_000);
        let bottom = ParticleCount::clamped(5_000);
        assert_eq!(bottom.step_down().get(), 5_000);
        assert_eq!(ParticleCount::default().step_down().get(), 14_000);
    }
}
