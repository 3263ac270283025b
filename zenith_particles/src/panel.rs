//! Control-panel state: the user-facing knobs and how key presses change
//! them.
//!
//! Shape and count changes must reach the particle field; point size and
//! colour only affect how the field is drawn.  [`Settings::apply`] reports
//! which of the two happened so the caller knows whether to regenerate.

use std::fmt;
use std::str::FromStr;

use morph_field::{GestureState, ParticleCount, Shape};

use crate::error::AppError;

pub const DEFAULT_POINT_SIZE: f32 = 0.1;
pub const MIN_POINT_SIZE:     f32 = 0.02;
pub const MAX_POINT_SIZE:     f32 = 0.5;
const POINT_SIZE_STEP:        f32 = 0.02;

// ════════════════════════════════════════════════════════════════════════════
// Rgb
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self { Rgb { r, g, b } }

    /// Opaque `0xFFRRGGBB`, the framebuffer pixel layout.
    pub fn to_argb(self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = AppError;

    /// Accepts `#rrggbb` or `rrggbb`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| AppError::InvalidColor(s.to_string()))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Panel swatches: blue, purple, pink.
pub const PALETTE: [Rgb; 3] = [
    Rgb::new(0x3b, 0x82, 0xf6),
    Rgb::new(0xa8, 0x55, 0xf7),
    Rgb::new(0xec, 0x48, 0x99),
];

// ════════════════════════════════════════════════════════════════════════════
// Settings
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub shape:      Shape,
    pub count:      ParticleCount,
    /// World-space point size before attenuation.
    pub point_size: f32,
    pub color:      Rgb,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            shape:      Shape::Sphere,
            count:      ParticleCount::default(),
            point_size: DEFAULT_POINT_SIZE,
            color:      PALETTE[0],
        }
    }
}

/// A panel interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    SelectShape(Shape),
    MoreParticles,
    FewerParticles,
    LargerPoints,
    SmallerPoints,
    NextColor,
}

/// What a [`ControlEvent`] changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// New target shape; the field must regenerate targets.
    Shape(Shape),
    /// New particle count; the field must reallocate.
    Count(ParticleCount),
    /// Point size or colour only.
    Render,
    /// Already at the requested value or limit.
    Nothing,
}

impl Settings {
    pub fn point_size_checked(size: f32) -> Result<f32, AppError> {
        if size.is_finite() && (MIN_POINT_SIZE..=MAX_POINT_SIZE).contains(&size) {
            Ok(size)
        } else {
            Err(AppError::InvalidPointSize(size))
        }
    }

    pub fn apply(&mut self, event: ControlEvent) -> Change {
        match event {
            ControlEvent::SelectShape(shape) => {
                if shape == self.shape { return Change::Nothing; }
                self.shape = shape;
                Change::Shape(shape)
            }
            ControlEvent::MoreParticles  => self.set_count(self.count.step_up()),
            ControlEvent::FewerParticles => self.set_count(self.count.step_down()),
            ControlEvent::LargerPoints   => self.set_point_size(self.point_size + POINT_SIZE_STEP),
            ControlEvent::SmallerPoints  => self.set_point_size(self.point_size - POINT_SIZE_STEP),
            ControlEvent::NextColor => {
                self.color = next_swatch(self.color);
                Change::Render
            }
        }
    }

    fn set_count(&mut self, count: ParticleCount) -> Change {
        if count == self.count { return Change::Nothing; }
        self.count = count;
        Change::Count(count)
    }

    fn set_point_size(&mut self, size: f32) -> Change {
        // Repeated f32 steps drift, so anything within half a step of a
        // bound lands exactly on it.
        let half = POINT_SIZE_STEP * 0.5;
        let size = if size - MIN_POINT_SIZE < half {
            MIN_POINT_SIZE
        } else if MAX_POINT_SIZE - size < half {
            MAX_POINT_SIZE
        } else {
            size
        };
        if (size - self.point_size).abs() < f32::EPSILON { return Change::Nothing; }
        self.point_size = size;
        Change::Render
    }
}

/// Swatch after `color`; a custom colour jumps to the first swatch.
fn next_swatch(color: Rgb) -> Rgb {
    match PALETTE.iter().position(|&c| c == color) {
        Some(i) => PALETTE[(i + 1) % PALETTE.len()],
        None    => PALETTE[0],
    }
}

/// Status-line label for the current gesture.
pub fn gesture_label(state: GestureState) -> &'static str {
    match state {
        GestureState::Open   => "Open (Expanded)",
        GestureState::Closed => "Closed (Contracted)",
        GestureState::NoHand => "Searching...",
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
