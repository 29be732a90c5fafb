use crate::camera::domain::camera_source::{CameraSource, CameraStatus};
use crate::camera::infrastructure::mjpeg_camera::MjpegCamera;
use crate::shared::frame::Frame;

/// Stream paths exposed by common phone webcam apps, tried in order.
const STREAM_ENDPOINTS: [&str; 4] = ["/video", "/videofeed", "/stream.mjpeg", "/mjpegfeed"];

/// Phone-as-webcam source: probes well-known MJPEG endpoints under a
/// base URL and delegates to the first one that answers.
pub struct MobileCamera {
    base_url: String,
    inner: Option<MjpegCamera>,
    error: Option<String>,
}

impl MobileCamera {
    /// `base_url` is the device root, e.g. `http://192.168.1.12:8080`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            inner: None,
            error: None,
        }
    }

    fn candidate_urls(&self) -> Vec<String> {
        STREAM_ENDPOINTS
            .iter()
            .map(|ep| format!("{}{ep}", self.base_url))
            .collect()
    }
}

impl CameraSource for MobileCamera {
    fn start(&mut self) -> bool {
        for url in self.candidate_urls() {
            let mut cam = MjpegCamera::new(&url);
            if cam.start() {
                log::info!("mobile camera: streaming from {url}");
                self.inner = Some(cam);
                self.error = None;
                return true;
            }
        }
        self.error = Some(format!("no stream endpoint answered under {}", self.base_url));
        false
    }

    fn stop(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            inner.stop();
        }
        self.inner = None;
    }

    fn read_frame(&mut self) -> Option<Frame> {
        self.inner.as_mut()?.read_frame()
    }

    fn status(&self) -> CameraStatus {
        match &self.inner {
            Some(inner) => {
                let mut status = inner.status();
                status.name = self.base_url.clone();
                status
            }
            None => {
                let mut status = CameraStatus::stopped(&self.base_url);
                status.error = self.error.clone();
                status
            }
        }
    }
}
