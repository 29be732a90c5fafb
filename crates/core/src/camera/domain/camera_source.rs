use crate::shared::frame::Frame;

/// Point-in-time view of a camera's health.
#[derive(Clone, Debug)]
pub struct CameraStatus {
    pub name: String,
    pub running: bool,
    pub resolution: (u32, u32),
    pub fps: f64,
    pub error: Option<String>,
}

impl CameraStatus {
    pub fn stopped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            running: false,
            resolution: (0, 0),
            fps: 0.0,
            error: None,
        }
    }
}

/// A single video source the manager can poll for frames.
///
/// Implementations own their connection state; `read_frame` returning
/// `None` signals a transient failure (the caller keeps the last good
/// frame and retries), while `status().error` reports a source that has
/// given up.
pub trait CameraSource: Send {
    /// Opens the source. Returns false when the source cannot start.
    fn start(&mut self) -> bool;

    fn stop(&mut self);

    /// Pulls the next frame, blocking briefly if one is not ready yet.
    fn read_frame(&mut self) -> Option<Frame>;

    fn status(&self) -> CameraStatus;
}
