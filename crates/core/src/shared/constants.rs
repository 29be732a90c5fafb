/// Run full detection every Nth tick; tracking covers the frames between.
pub const DETECTION_INTERVAL: u64 = 5;

/// Frames are downscaled to this width before tracking/detection.
pub const PROCESSING_WIDTH: u32 = 1280;

pub const MIN_FACE_SIZE: f64 = 20.0;
pub const MAX_FACE_SIZE: f64 = 400.0;

/// Seconds a face must dwell before attendance counts it as present.
pub const DEFAULT_VERIFICATION_TIME: f64 = 10.0;

/// Seconds without a sighting before a present person is marked away.
pub const DEFAULT_AWAY_THRESHOLD: f64 = 30.0;

/// Trailing-window length for position/distance smoothing.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Average adult face width used by the pinhole distance model.
pub const KNOWN_FACE_WIDTH_CM: f64 = 15.0;

/// Empirical correction applied to raw pinhole distances.
pub const DISTANCE_CORRECTION: f64 = 1.0 / 1.7;

/// Uncalibrated focal length defaults to frame width times this factor.
pub const FOCAL_LENGTH_FACTOR: f64 = 1.5;

pub const DEFAULT_CAMERA_WIDTH: u32 = 320;
pub const DEFAULT_CAMERA_HEIGHT: u32 = 240;
pub const DEFAULT_CAMERA_FPS: f64 = 30.0;

/// Camera sources retry a failed read this many times before giving up.
pub const CAMERA_RECONNECT_ATTEMPTS: u32 = 3;

/// Minimum seconds between accepted drawing requests (~60 fps cap).
pub const DRAW_MIN_INTERVAL: f64 = 1.0 / 60.0;

/// Bounded capacity of every pool input/output queue.
pub const POOL_QUEUE_CAPACITY: usize = 8;

/// Worker receive timeout; bounds how long shutdown can go unnoticed.
pub const POOL_RECV_TIMEOUT_MS: u64 = 100;

/// Frames a stable face id survives without a matching detection.
pub const ID_GRACE_FRAMES: u64 = 30;

pub const DEFAULT_DISPLAY_BUFFER_SIZE: usize = 3;
