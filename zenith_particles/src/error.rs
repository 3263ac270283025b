//! Application-level errors.

use gesture_vision::VisionError;
use morph_field::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The visualizer window could not be created
    #[error("window error: {0}")]
    Window(String),

    /// Shape, gesture or particle count rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Colour is not `#rrggbb`
    #[error("invalid colour {0:?}, expected #rrggbb")]
    InvalidColor(String),

    /// Point size outside the panel range
    #[error("point size {0} outside [{min}, {max}]", min = crate::panel::MIN_POINT_SIZE, max = crate::panel::MAX_POINT_SIZE)]
    InvalidPointSize(f32),

    /// Frame capture or classification could not be set up
    #[error(transparent)]
    Vision(#[from] VisionError),
}
