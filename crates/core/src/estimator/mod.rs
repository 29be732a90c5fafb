pub mod distance_tracker;
pub mod position_tracker;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("frame dimensions not configured; call set_frame_width first")]
    FrameNotConfigured,
    #[error("face box width must be positive, got {0}")]
    InvalidFaceWidth(f64),
}
