use std::time::Duration;

use crate::camera::domain::camera_source::{CameraSource, CameraStatus};
use crate::shared::constants::CAMERA_RECONNECT_ATTEMPTS;
use crate::shared::frame::Frame;

const REOPEN_DELAY: Duration = Duration::from_millis(500);

/// Camera backed by anything libavformat can open: RTSP URLs, V4L2
/// devices, or plain video files. Decodes to RGB24 via ffmpeg-next.
///
/// On end of stream the input is reopened, up to
/// [`CAMERA_RECONNECT_ATTEMPTS`] times per read. For file inputs a
/// reopen restarts decoding from the first frame, so finite files loop.
pub struct FfmpegCamera {
    input: String,
    ictx: Option<ffmpeg_next::format::context::Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    stream_index: usize,
    resolution: (u32, u32),
    fps: f64,
    seq: u64,
    error: Option<String>,
}

// Safety: FfmpegCamera is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegCamera {}

impl FfmpegCamera {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
            ictx: None,
            decoder: None,
            scaler: None,
            stream_index: 0,
            resolution: (0, 0),
            fps: 0.0,
            seq: 0,
            error: None,
        }
    }

    fn open(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(&self.input)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("no video stream found")?;
        self.stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        self.fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        self.resolution = (decoder.width(), decoder.height());

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg_next::format::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        self.decoder = Some(decoder);
        self.scaler = Some(scaler);
        self.ictx = Some(ictx);
        Ok(())
    }

    fn try_receive(&mut self) -> Option<Frame> {
        let decoder = self.decoder.as_mut()?;
        let scaler = self.scaler.as_mut()?;

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }
        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = scaler.run(&decoded, &mut rgb) {
            log::warn!("ffmpeg camera {}: scaler failed: {e}", self.input);
            return None;
        }

        let (w, h) = self.resolution;
        let frame = Frame::new(strip_stride(&rgb, w, h), w, h, 3, self.seq);
        self.seq += 1;
        Some(frame)
    }

    /// Decodes packets until a frame comes out or the stream ends.
    /// Returns None on end of stream, after flushing the decoder.
    fn pump(&mut self) -> Option<Frame> {
        if let Some(frame) = self.try_receive() {
            return Some(frame);
        }

        loop {
            let ictx = self.ictx.as_mut()?;
            let Some((stream, packet)) = ictx.packets().next() else {
                if let Some(decoder) = self.decoder.as_mut() {
                    let _ = decoder.send_eof();
                }
                return self.try_receive();
            };

            if stream.index() != self.stream_index {
                continue;
            }
            let decoder = self.decoder.as_mut()?;
            if decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(frame) = self.try_receive() {
                return Some(frame);
            }
        }
    }
}

/// Copies pixels out of an ffmpeg frame, dropping per-row padding bytes.
fn strip_stride(rgb: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let w = width as usize;

    let mut pixels = Vec::with_capacity(w * height as usize * 3);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + w * 3]);
    }
    pixels
}

impl CameraSource for FfmpegCamera {
    fn start(&mut self) -> bool {
        match self.open() {
            Ok(()) => {
                self.error = None;
                self.seq = 0;
                true
            }
            Err(e) => {
                log::error!("ffmpeg camera {}: open failed: {e}", self.input);
                self.error = Some(e.to_string());
                false
            }
        }
    }

    fn stop(&mut self) {
        self.ictx = None;
        self.decoder = None;
        self.scaler = None;
    }

    fn read_frame(&mut self) -> Option<Frame> {
        for attempt in 0..=CAMERA_RECONNECT_ATTEMPTS {
            if attempt > 0 {
                log::info!(
                    "ffmpeg camera {}: reopening input (attempt {attempt}/{CAMERA_RECONNECT_ATTEMPTS})",
                    self.input
                );
                std::thread::sleep(REOPEN_DELAY);
                if let Err(e) = self.open() {
                    self.error = Some(e.to_string());
                    continue;
                }
                self.error = None;
            }

            if let Some(frame) = self.pump() {
                self.error = None;
                return Some(frame);
            }
        }

        if self.error.is_none() {
            self.error = Some("stream ended".to_string());
        }
        self.stop();
        None
    }

    fn status(&self) -> CameraStatus {
        CameraStatus {
            name: self.input.clone(),
            running: self.ictx.is_some() && self.error.is_none(),
            resolution: self.resolution,
            fps: self.fps,
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_gives_up_after_bounded_attempts() {
        let mut cam = FfmpegCamera::new("/no/such/input.mp4");
        assert!(!cam.start());
        // Must terminate after the reopen budget, not retry forever.
        assert!(cam.read_frame().is_none());
        let status = cam.status();
        assert!(!status.running);
        assert!(status.error.is_some());
    }
}
