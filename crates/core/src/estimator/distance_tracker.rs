use std::collections::{HashMap, VecDeque};

use crate::estimator::EstimatorError;
use crate::shared::constants::{
    DEFAULT_SMOOTHING_WINDOW, DISTANCE_CORRECTION, FOCAL_LENGTH_FACTOR, KNOWN_FACE_WIDTH_CM,
};
use crate::shared::geometry::FaceBox;

#[derive(Clone, Copy, Debug)]
pub struct DistanceEstimate {
    pub centimeters: f64,
    pub meters: f64,
}

/// Pinhole-model distance estimation from apparent face width.
///
/// distance = real_width * focal / pixel_width, scaled by an empirical
/// correction for the difference between detector boxes and true face
/// width. The focal length defaults to `frame_width * 1.5` until a
/// calibration at a known distance replaces it. Per-face smoothing
/// mirrors [`PositionTracker`](crate::estimator::position_tracker::PositionTracker).
pub struct DistanceTracker {
    frame_width: Option<u32>,
    focal_length: Option<f64>,
    window: usize,
    histories: HashMap<u32, VecDeque<f64>>,
}

impl DistanceTracker {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_SMOOTHING_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            frame_width: None,
            focal_length: None,
            window: window.max(1),
            histories: HashMap::new(),
        }
    }

    pub fn set_frame_width(&mut self, width: u32) {
        self.frame_width = Some(width);
    }

    /// Derives the focal length from a face of known real-world distance.
    /// Overrides the frame-width default for all later estimates.
    pub fn calibrate_focal_length(
        &mut self,
        known_distance_cm: f64,
        face_width_px: f64,
    ) -> Result<f64, EstimatorError> {
        if face_width_px <= 0.0 {
            return Err(EstimatorError::InvalidFaceWidth(face_width_px));
        }
        let focal = known_distance_cm * face_width_px / KNOWN_FACE_WIDTH_CM;
        self.focal_length = Some(focal);
        Ok(focal)
    }

    /// Folds one observation into the face's window and returns the
    /// smoothed distance.
    pub fn estimate_distance(
        &mut self,
        face_id: u32,
        bbox: &FaceBox,
    ) -> Result<DistanceEstimate, EstimatorError> {
        if bbox.w <= 0.0 {
            return Err(EstimatorError::InvalidFaceWidth(bbox.w));
        }
        let focal = match self.focal_length {
            Some(f) => f,
            None => {
                let width = self.frame_width.ok_or(EstimatorError::FrameNotConfigured)?;
                f64::from(width) * FOCAL_LENGTH_FACTOR
            }
        };

        let raw = KNOWN_FACE_WIDTH_CM * focal / bbox.w * DISTANCE_CORRECTION;

        let history = self.histories.entry(face_id).or_default();
        history.push_back(raw);
        if history.len() > self.window {
            history.pop_front();
        }
        let centimeters = history.iter().sum::<f64>() / history.len() as f64;

        Ok(DistanceEstimate {
            centimeters,
            meters: centimeters / 100.0,
        })
    }

    /// Drops smoothing windows for ids no longer tracked.
    pub fn cleanup_stale_faces(&mut self, active_ids: &[u32]) {
        self.histories.retain(|id, _| active_ids.contains(id));
    }

    pub fn tracked_faces(&self) -> usize {
        self.histories.len()
    }
}

impl Default for DistanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_focal_from_frame_width() {
        let mut t = DistanceTracker::new();
        t.set_frame_width(640);
        // focal = 960; 15 * 960 / 160 px * (1/1.7) = 90 / 1.7 cm.
        let est = t
            .estimate_distance(1, &FaceBox::new(0.0, 0.0, 160.0, 160.0))
            .unwrap();
        assert_relative_eq!(est.centimeters, 90.0 / 1.7, epsilon = 1e-9);
        assert_relative_eq!(est.meters, est.centimeters / 100.0);
    }

    #[test]
    fn test_calibration_overrides_default() {
        let mut t = DistanceTracker::new();
        t.set_frame_width(640);
        // A 100px face at 60cm gives focal = 60 * 100 / 15 = 400.
        let focal = t.calibrate_focal_length(60.0, 100.0).unwrap();
        assert_relative_eq!(focal, 400.0);

        let est = t
            .estimate_distance(1, &FaceBox::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        assert_relative_eq!(est.centimeters, 60.0 * DISTANCE_CORRECTION, epsilon = 1e-9);
    }

    #[test]
    fn test_closer_face_is_larger() {
        let mut t = DistanceTracker::with_window(1);
        t.set_frame_width(640);
        let near = t
            .estimate_distance(1, &FaceBox::new(0.0, 0.0, 200.0, 200.0))
            .unwrap();
        let far = t
            .estimate_distance(2, &FaceBox::new(0.0, 0.0, 50.0, 50.0))
            .unwrap();
        assert!(near.centimeters < far.centimeters);
    }

    #[test]
    fn test_smoothing_dampens_width_jitter() {
        let mut t = DistanceTracker::with_window(5);
        t.set_frame_width(640);
        let steady = t
            .estimate_distance(1, &FaceBox::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        // One noisy wide observation moves the mean, but far less than
        // the raw reading would.
        let jittered = t
            .estimate_distance(1, &FaceBox::new(0.0, 0.0, 200.0, 200.0))
            .unwrap();
        assert!(jittered.centimeters < steady.centimeters);
        assert!(jittered.centimeters > steady.centimeters / 2.0);
    }

    #[test]
    fn test_zero_width_box_is_an_error() {
        let mut t = DistanceTracker::new();
        t.set_frame_width(640);
        let result = t.estimate_distance(1, &FaceBox::new(0.0, 0.0, 0.0, 50.0));
        assert!(matches!(result, Err(EstimatorError::InvalidFaceWidth(_))));
    }

    #[test]
    fn test_no_frame_width_and_no_calibration_is_an_error() {
        let mut t = DistanceTracker::new();
        let result = t.estimate_distance(1, &FaceBox::new(0.0, 0.0, 100.0, 100.0));
        assert!(matches!(result, Err(EstimatorError::FrameNotConfigured)));
    }

    #[test]
    fn test_cleanup_drops_stale_windows() {
        let mut t = DistanceTracker::new();
        t.set_frame_width(640);
        for id in [1, 2] {
            t.estimate_distance(id, &FaceBox::new(0.0, 0.0, 100.0, 100.0))
                .unwrap();
        }
        t.cleanup_stale_faces(&[]);
        assert_eq!(t.tracked_faces(), 0);
    }
}
