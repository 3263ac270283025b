//! Gesture classification seam.
//!
//! A [`GestureClassifier`] turns one encoded frame into a
//! [`GestureReading`].  Real classifiers are slow and fallible, so the rest
//! of the system only talks to them through [`classify_or_neutral`].

use log::{debug, warn};
use morph_field::GestureState;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::EncodedFrame;

/// Instruction sent alongside each frame.
pub const GESTURE_PROMPT: &str = "Look at the image and report the state of the human hand: \
'open' if the fingers are spread, 'closed' if it is a fist, 'none' if no hand is visible. \
Answer with JSON only, with the properties 'state' and 'confidence' (0 to 1).";

// ════════════════════════════════════════════════════════════════════════════
// GestureReading
// ════════════════════════════════════════════════════════════════════════════

/// One classification result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureReading {
    pub state:      GestureState,
    /// In `[0, 1]`.
    pub confidence: f32,
}

impl GestureReading {
    /// What every failure degrades to.
    pub const NEUTRAL: GestureReading = GestureReading {
        state:      GestureState::NoHand,
        confidence: 0.0,
    };

    pub fn new(state: GestureState, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 };
        GestureReading { state, confidence }
    }
}

#[derive(Deserialize)]
struct RawReading {
    state:      String,
    #[serde(default)]
    confidence: f32,
}

/// Parse a classifier response of the form
/// `{"state": "open" | "closed" | "none", "confidence": 0.87}`.
///
/// Surrounding whitespace and a Markdown code fence are tolerated;
/// confidence is clamped to `[0, 1]`.
pub fn parse_reading(text: &str) -> Result<GestureReading> {
    let raw: RawReading = serde_json::from_str(strip_fence(text))?;
    let state = raw.state.parse::<GestureState>()?;
    Ok(GestureReading::new(state, raw.confidence))
}

fn strip_fence(text: &str) -> &str {
    let t = text.trim();
    match t.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => t,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Request payload
// ════════════════════════════════════════════════════════════════════════════

/// JSON body handed to an external classifier.
#[derive(Debug, Serialize)]
pub struct ClassifyRequest<'a> {
    pub mime_type: &'static str,
    pub data:      &'a str,
    pub prompt:    &'static str,
}

impl<'a> ClassifyRequest<'a> {
    pub fn new(frame: &'a EncodedFrame) -> Self {
        ClassifyRequest {
            mime_type: frame.mime_type(),
            data:      &frame.data,
            prompt:    GESTURE_PROMPT,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureClassifier
// ════════════════════════════════════════════════════════════════════════════

/// Something that can label a frame as open / closed / none.
pub trait GestureClassifier: Send {
    fn classify(&mut self, frame: &EncodedFrame) -> Result<GestureReading>;
}

impl<C: GestureClassifier + ?Sized> GestureClassifier for Box<C> {
    fn classify(&mut self, frame: &EncodedFrame) -> Result<GestureReading> {
        (**self).classify(frame)
    }
}

/// Classify `frame`, turning any failure into [`GestureReading::NEUTRAL`].
pub fn classify_or_neutral<C>(classifier: &mut C, frame: &EncodedFrame) -> GestureReading
where
    C: GestureClassifier + ?Sized,
{
    match classifier.classify(frame) {
        Ok(reading) => {
            debug!("classify: {} ({:.2})", reading.state, reading.confidence);
            reading
        }
        Err(e) => {
            warn!("gesture recognition failed, falling back to none: {}", e);
            GestureReading::NEUTRAL
        }
    }
}

/// Always answers with the same reading.  Useful offline and in demos.
#[derive(Clone, Copy, Debug)]
pub struct FixedClassifier(pub GestureReading);

impl FixedClassifier {
    pub fn open_hand() -> Self {
        FixedClassifier(GestureReading::new(GestureState::Open, 1.0))
    }
}

impl GestureClassifier for FixedClassifier {
    fn classify(&mut self, _frame: &EncodedFrame) -> Result<GestureReading> {
        Ok(self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
