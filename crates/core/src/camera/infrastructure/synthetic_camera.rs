use std::time::Duration;

use crate::camera::domain::camera_source::{CameraSource, CameraStatus};
use crate::shared::frame::Frame;

/// Deterministic source producing a white square drifting across a black
/// frame. Used by tests and the demo pipeline; failures can be scripted
/// to exercise manager recovery paths.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    fps: f64,
    seq: u64,
    running: bool,
    refuse_start: bool,
    fail_after: Option<u64>,
    error: Option<String>,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
            seq: 0,
            running: false,
            refuse_start: false,
            fail_after: None,
            error: None,
        }
    }

    /// Makes the next `start` call fail.
    pub fn refuse_start(&mut self) {
        self.refuse_start = true;
    }

    /// Reads beyond the Nth return `None` and flag an error.
    pub fn fail_after(&mut self, frames: u64) {
        self.fail_after = Some(frames);
    }

    fn render(&self) -> Frame {
        let mut frame = Frame::blank(self.width, self.height, self.seq);
        let square = 8u32.min(self.width).min(self.height);
        let max_x = self.width - square;
        let x0 = if max_x > 0 {
            ((self.seq * 2) % u64::from(max_x)) as u32
        } else {
            0
        };
        let y0 = (self.height - square) / 2;

        let mut arr = frame.as_ndarray_mut();
        for y in y0..y0 + square {
            for x in x0..x0 + square {
                for c in 0..3usize {
                    arr[[y as usize, x as usize, c]] = 255;
                }
            }
        }
        drop(arr);
        frame
    }
}

impl CameraSource for SyntheticCamera {
    fn start(&mut self) -> bool {
        if self.refuse_start {
            self.error = Some("synthetic start refused".to_string());
            return false;
        }
        self.running = true;
        self.seq = 0;
        self.error = None;
        true
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn read_frame(&mut self) -> Option<Frame> {
        if !self.running {
            return None;
        }
        if let Some(limit) = self.fail_after {
            if self.seq >= limit {
                self.error = Some("synthetic source exhausted".to_string());
                return None;
            }
        }
        if self.fps > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(1.0 / self.fps));
        }
        let frame = self.render();
        self.seq += 1;
        Some(frame)
    }

    fn status(&self) -> CameraStatus {
        CameraStatus {
            name: "synthetic".to_string(),
            running: self.running && self.error.is_none(),
            resolution: (self.width, self.height),
            fps: self.fps,
            error: self.error.clone(),
        }
    }
}
