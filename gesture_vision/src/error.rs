//! Error types for frame capture and classification.

use std::io;
use std::time::Duration;

use morph_field::ConfigError;
use thiserror::Error;

/// Result alias for vision operations.
pub type Result<T> = std::result::Result<T, VisionError>;

/// Anything that can go wrong between grabbing a frame and reading back a
/// gesture.
#[derive(Debug, Error)]
pub enum VisionError {
    /// I/O error talking to a file or child process
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Frame could not be decoded or encoded
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// No frames can be acquired
    #[error("camera unavailable: {0}")]
    Camera(String),

    /// Classifier ran but did not produce a result
    #[error("classifier failed: {0}")]
    Classifier(String),

    /// Classifier did not answer in time
    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),

    /// Response was not the expected JSON object
    #[error("malformed classifier response: {0}")]
    Json(#[from] serde_json::Error),

    /// Response named a gesture outside open/closed/none
    #[error("unrecognised gesture in response: {0}")]
    Gesture(#[from] ConfigError),
}
