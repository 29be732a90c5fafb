use std::io::Read;
use std::time::Duration;

use crate::camera::domain::camera_source::{CameraSource, CameraStatus};
use crate::shared::constants::CAMERA_RECONNECT_ATTEMPTS;
use crate::shared::frame::Frame;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const RECONNECT_DELAY: Duration = Duration::from_millis(500);
const READ_CHUNK: usize = 8192;
/// Bytes of unparsed stream kept before assuming the stream is garbage.
const MAX_PENDING: usize = 5 * 1024 * 1024;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// HTTP MJPEG stream camera (IP webcams, `/video` endpoints).
///
/// Scans the byte stream for JPEG start/end markers and decodes each
/// complete image to an RGB frame. Transient stream failures trigger a
/// bounded number of reconnects before the source reports an error.
pub struct MjpegCamera {
    url: String,
    stream: Option<Box<dyn Read + Send>>,
    pending: Vec<u8>,
    seq: u64,
    resolution: (u32, u32),
    error: Option<String>,
}

impl MjpegCamera {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            stream: None,
            pending: Vec::new(),
            seq: 0,
            resolution: (0, 0),
            error: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[cfg(test)]
    fn with_stream(url: &str, stream: Box<dyn Read + Send>) -> Self {
        let mut cam = Self::new(url);
        cam.stream = Some(stream);
        cam
    }

    fn connect(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None::<Duration>)
            .build()?;
        let response = client.get(&self.url).send()?;
        if !response.status().is_success() {
            return Err(format!("http status {}", response.status()).into());
        }
        self.pending.clear();
        self.stream = Some(Box::new(response));
        Ok(())
    }

    fn decode_next(&mut self) -> Option<Frame> {
        let jpeg = extract_jpeg(&mut self.pending)?;
        match image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg) {
            Ok(img) => {
                let rgb = img.to_rgb8();
                let (w, h) = rgb.dimensions();
                self.resolution = (w, h);
                let frame = Frame::new(rgb.into_raw(), w, h, 3, self.seq);
                self.seq += 1;
                Some(frame)
            }
            Err(e) => {
                log::warn!("mjpeg {}: undecodable image segment: {e}", self.url);
                None
            }
        }
    }

    fn fill_pending(&mut self) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        let mut chunk = [0u8; READ_CHUNK];
        match stream.read(&mut chunk) {
            Ok(0) => false,
            Ok(n) => {
                self.pending.extend_from_slice(&chunk[..n]);
                if self.pending.len() > MAX_PENDING {
                    log::warn!("mjpeg {}: no frame markers in {MAX_PENDING} bytes", self.url);
                    self.pending.clear();
                }
                true
            }
            Err(e) => {
                log::warn!("mjpeg {}: stream read failed: {e}", self.url);
                false
            }
        }
    }
}

/// Extracts one complete JPEG (SOI..EOI) from the buffer, discarding any
/// bytes before the image.
fn extract_jpeg(pending: &mut Vec<u8>) -> Option<Vec<u8>> {
    let start = find_marker(pending, &JPEG_SOI, 0)?;
    let end = find_marker(pending, &JPEG_EOI, start + 2)? + 2;
    let jpeg = pending[start..end].to_vec();
    pending.drain(..end);
    Some(jpeg)
}

fn find_marker(buf: &[u8], marker: &[u8; 2], from: usize) -> Option<usize> {
    if buf.len() < from + 2 {
        return None;
    }
    buf[from..]
        .windows(2)
        .position(|w| w == marker)
        .map(|p| p + from)
}

impl CameraSource for MjpegCamera {
    fn start(&mut self) -> bool {
        for attempt in 1..=CAMERA_RECONNECT_ATTEMPTS {
            match self.connect() {
                Ok(()) => {
                    self.error = None;
                    return true;
                }
                Err(e) => {
                    log::warn!(
                        "mjpeg {}: connect attempt {attempt}/{CAMERA_RECONNECT_ATTEMPTS} failed: {e}",
                        self.url
                    );
                    self.error = Some(e.to_string());
                    std::thread::sleep(RECONNECT_DELAY * attempt);
                }
            }
        }
        false
    }

    fn stop(&mut self) {
        self.stream = None;
        self.pending.clear();
    }

    fn read_frame(&mut self) -> Option<Frame> {
        let mut reconnects = 0;
        loop {
            if let Some(frame) = self.decode_next() {
                return Some(frame);
            }
            if self.fill_pending() {
                continue;
            }

            // Stream is dead; try to re-establish it a bounded number of
            // times before reporting the failure upward.
            reconnects += 1;
            if reconnects > CAMERA_RECONNECT_ATTEMPTS {
                self.error = Some("stream lost, reconnects exhausted".to_string());
                self.stream = None;
                return None;
            }
            std::thread::sleep(RECONNECT_DELAY);
            if let Err(e) = self.connect() {
                log::warn!("mjpeg {}: reconnect failed: {e}", self.url);
            }
        }
    }

    fn status(&self) -> CameraStatus {
        CameraStatus {
            name: self.url.clone(),
            running: self.stream.is_some() && self.error.is_none(),
            resolution: self.resolution,
            fps: 0.0,
            error: self.error.clone(),
        }
    }
}
