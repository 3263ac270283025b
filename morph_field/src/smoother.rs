//! Expansion smoothing.
//!
//! The gesture signal is coarse (a new classification every couple of
//! seconds) and can flip at any time.  [`ExpansionSmoother`] turns it into a
//! continuous scalar by exponentially easing toward a per-gesture target
//! once per rendered frame.

use crate::gesture::GestureState;
use crate::lerp;

/// Expansion target while the hand is open.
pub const OPEN_EXPANSION:    f32 = 2.5;
/// Expansion target while the hand is closed.
pub const CLOSED_EXPANSION:  f32 = 0.4;
/// Expansion target with no hand in view.
pub const NEUTRAL_EXPANSION: f32 = 1.0;
/// Fraction of the remaining gap covered per frame.
pub const DEFAULT_ALPHA:     f32 = 0.05;

// ════════════════════════════════════════════════════════════════════════════
// Smoothing
// ════════════════════════════════════════════════════════════════════════════

/// How the per-frame interpolation fraction is derived.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Smoothing {
    /// Fixed fraction per rendered frame, whatever the frame rate.
    FrameCoupled { alpha: f32 },
    /// `alpha` is the fraction per frame at `reference_fps`; other frame
    /// times are rescaled so convergence speed is the same in wall-clock
    /// time.
    TimeScaled { alpha: f32, reference_fps: f32 },
}

impl Smoothing {
    /// Default fraction, normalised to 60 fps.
    pub const fn time_scaled() -> Self {
        Smoothing::TimeScaled { alpha: DEFAULT_ALPHA, reference_fps: 60.0 }
    }

    /// Interpolation fraction for a frame that took `delta` seconds.
    pub fn factor(self, delta: f32) -> f32 {
        match self {
            Smoothing::FrameCoupled { alpha } => alpha,
            Smoothing::TimeScaled { alpha, reference_fps } => {
                let frames = delta.max(0.0) * reference_fps;
                1.0 - (1.0 - alpha).powf(frames)
            }
        }
    }
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::FrameCoupled { alpha: DEFAULT_ALPHA }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ExpansionSmoother
// ════════════════════════════════════════════════════════════════════════════

/// Target expansion for a gesture.
pub fn expansion_target(state: GestureState) -> f32 {
    match state {
        GestureState::Open   => OPEN_EXPANSION,
        GestureState::Closed => CLOSED_EXPANSION,
        GestureState::NoHand => NEUTRAL_EXPANSION,
    }
}

/// The persistent expansion scalar.
#[derive(Clone, Debug)]
pub struct ExpansionSmoother {
    value:     f32,
    smoothing: Smoothing,
}

impl ExpansionSmoother {
    pub fn new(smoothing: Smoothing) -> Self {
        ExpansionSmoother { value: NEUTRAL_EXPANSION, smoothing }
    }

    pub fn value(&self) -> f32 { self.value }

    pub fn set_smoothing(&mut self, smoothing: Smoothing) {
        self.smoothing = smoothing;
    }

    /// Advance one frame toward the target for `state`.  Returns the new
    /// value.
    pub fn update(&mut self, state: GestureState, delta: f32) -> f32 {
        let t = self.smoothing.factor(delta);
        self.value = lerp(self.value, expansion_target(state), t);
        self.value
    }
}

impl Default for ExpansionSmoother {
    fn default() -> Self {
        Self::new(Smoothing::default())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
