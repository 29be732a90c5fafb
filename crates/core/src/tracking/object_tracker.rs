use crate::shared::frame::Frame;
use crate::shared::geometry::FaceBox;

/// Short-horizon single-target tracker filling the frames between full
/// detector runs. Implementations are re-created and re-initialized on
/// every detector hit, so drift only has a few frames to accumulate.
pub trait ObjectTracker: Send {
    /// Locks the tracker onto the region of `frame` covered by `bbox`.
    fn init(&mut self, frame: &Frame, bbox: FaceBox);

    /// Locates the target in a new frame. `None` means the target was
    /// lost and a fresh detection pass is needed.
    fn update(&mut self, frame: &Frame) -> Option<FaceBox>;
}

/// Template grid sampled from the initial box (per axis).
const GRID: usize = 16;
/// Search extent around the last position, in pixels.
const SEARCH_RADIUS: i32 = 24;
/// Scan stride inside the search window.
const SEARCH_STEP: i32 = 2;
/// Mean absolute grayscale difference above which the match is rejected.
const MAX_MATCH_ERROR: f64 = 40.0;

/// Appearance tracker matching a fixed grayscale template by sum of
/// absolute differences over a coarse sampling grid.
pub struct PatchTracker {
    template: Vec<u8>,
    bbox: Option<FaceBox>,
}

impl PatchTracker {
    pub fn new() -> Self {
        Self {
            template: Vec::new(),
            bbox: None,
        }
    }

    fn sample_grid(frame: &Frame, bbox: &FaceBox) -> Vec<u8> {
        let mut grid = Vec::with_capacity(GRID * GRID);
        for gy in 0..GRID {
            for gx in 0..GRID {
                let x = bbox.x + bbox.w * (gx as f64 + 0.5) / GRID as f64;
                let y = bbox.y + bbox.h * (gy as f64 + 0.5) / GRID as f64;
                grid.push(gray_at(frame, x, y));
            }
        }
        grid
    }

    fn match_error(&self, frame: &Frame, bbox: &FaceBox) -> f64 {
        let sample = Self::sample_grid(frame, bbox);
        let sad: u64 = sample
            .iter()
            .zip(&self.template)
            .map(|(&a, &b)| u64::from(a.abs_diff(b)))
            .sum();
        sad as f64 / (GRID * GRID) as f64
    }
}

impl Default for PatchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTracker for PatchTracker {
    fn init(&mut self, frame: &Frame, bbox: FaceBox) {
        self.template = Self::sample_grid(frame, &bbox);
        self.bbox = Some(bbox);
    }

    fn update(&mut self, frame: &Frame) -> Option<FaceBox> {
        let last = self.bbox?;
        if frame.is_empty() || self.template.is_empty() {
            return None;
        }

        let mut best_error = f64::INFINITY;
        let mut best = last;
        let mut dy = -SEARCH_RADIUS;
        while dy <= SEARCH_RADIUS {
            let mut dx = -SEARCH_RADIUS;
            while dx <= SEARCH_RADIUS {
                let candidate = FaceBox::new(
                    last.x + f64::from(dx),
                    last.y + f64::from(dy),
                    last.w,
                    last.h,
                );
                let error = self.match_error(frame, &candidate);
                if error < best_error {
                    best_error = error;
                    best = candidate;
                }
                dx += SEARCH_STEP;
            }
            dy += SEARCH_STEP;
        }

        if best_error > MAX_MATCH_ERROR {
            self.bbox = None;
            return None;
        }
        let clamped = best.clamp_to(frame.width(), frame.height());
        self.bbox = Some(clamped);
        Some(clamped)
    }
}

fn gray_at(frame: &Frame, x: f64, y: f64) -> u8 {
    let xi = (x.max(0.0) as u32).min(frame.width().saturating_sub(1));
    let yi = (y.max(0.0) as u32).min(frame.height().saturating_sub(1));
    let ch = frame.channels() as usize;
    let idx = (yi as usize * frame.width() as usize + xi as usize) * ch;
    let px = &frame.data()[idx..idx + ch.min(3)];
    let sum: u32 = px.iter().map(|&b| u32::from(b)).sum();
    (sum / px.len().max(1) as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Black frame with a white square at (x, y), 20x20.
    fn frame_with_square(x: usize, y: usize) -> Frame {
        let mut frame = Frame::blank(160, 120, 0);
        {
            let mut arr = frame.as_ndarray_mut();
            for yy in y..(y + 20).min(120) {
                for xx in x..(x + 20).min(160) {
                    for c in 0..3 {
                        arr[[yy, xx, c]] = 255;
                    }
                }
            }
        }
        frame
    }

    #[test]
    fn test_tracks_small_translation() {
        let mut tracker = PatchTracker::new();
        tracker.init(&frame_with_square(40, 40), FaceBox::new(40.0, 40.0, 20.0, 20.0));

        let moved = frame_with_square(46, 43);
        let bbox = tracker.update(&moved).expect("target should be found");
        assert!((bbox.x - 46.0).abs() <= 2.0, "x = {}", bbox.x);
        assert!((bbox.y - 43.0).abs() <= 2.0, "y = {}", bbox.y);
    }

    #[test]
    fn test_reports_loss_when_target_vanishes() {
        let mut tracker = PatchTracker::new();
        tracker.init(&frame_with_square(40, 40), FaceBox::new(40.0, 40.0, 20.0, 20.0));

        let empty = Frame::blank(160, 120, 1);
        assert!(tracker.update(&empty).is_none());
        // Loss is sticky until re-initialized.
        assert!(tracker.update(&frame_with_square(40, 40)).is_none());
    }

    #[test]
    fn test_update_without_init_returns_none() {
        let mut tracker = PatchTracker::new();
        assert!(tracker.update(&Frame::blank(32, 32, 0)).is_none());
    }

    #[test]
    fn test_reinit_recovers_tracking() {
        let mut tracker = PatchTracker::new();
        tracker.init(&frame_with_square(40, 40), FaceBox::new(40.0, 40.0, 20.0, 20.0));
        assert!(tracker.update(&Frame::blank(160, 120, 1)).is_none());

        tracker.init(&frame_with_square(80, 60), FaceBox::new(80.0, 60.0, 20.0, 20.0));
        assert!(tracker.update(&frame_with_square(82, 60)).is_some());
    }
}
