#[cfg(feature = "camera-ffmpeg")]
pub mod ffmpeg_camera;
pub mod mjpeg_camera;
pub mod mobile_camera;
pub mod synthetic_camera;
