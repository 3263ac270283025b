//! # gesture_vision
//!
//! Turns camera frames into the coarse [`GestureState`] signal that drives
//! the particle field.
//!
//! * [`frame`]: frame sources and JPEG/base64 encoding at reduced size.
//! * [`classify`]: the classifier seam, response parsing and the neutral
//!   fallback.
//! * [`command`]: a classifier that delegates to an external program.
//!
//! Nothing here ever hands an error to the animation core: callers go
//! through [`classify_or_neutral`], which turns any failure into
//! `{state: none, confidence: 0}` and logs it.
//!
//! ```rust,no_run
//! use gesture_vision::{classify_or_neutral, encode_frame, FixedClassifier, FrameFormat,
//!                      FrameSource, StillFrames};
//!
//! let mut frames = StillFrames::open("frames/").unwrap();
//! let frame = encode_frame(&frames.grab().unwrap(), FrameFormat::default()).unwrap();
//! let mut classifier = FixedClassifier::open_hand();
//! let reading = classify_or_neutral(&mut classifier, &frame);
//! println!("{} ({:.2})", reading.state, reading.confidence);
//! ```
//!
//! [`GestureState`]: morph_field::GestureState

pub mod classify;
pub mod command;
pub mod frame;

mod error;

pub use classify::{
    classify_or_neutral, parse_reading, ClassifyRequest, FixedClassifier, GestureClassifier,
    GestureReading, GESTURE_PROMPT,
};
pub use command::CommandClassifier;
pub use error::{Result, VisionError};
pub use frame::{encode_frame, EncodedFrame, FrameFormat, FrameSource, StillFrames};
