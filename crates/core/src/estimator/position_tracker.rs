use std::collections::{HashMap, VecDeque};

use crate::estimator::EstimatorError;
use crate::shared::constants::DEFAULT_SMOOTHING_WINDOW;
use crate::shared::geometry::FaceBox;

/// Which half of the frame the smoothed center falls in. A dead-center
/// face (offset exactly 0) reads as `Right`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HorizontalSide {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug)]
pub struct PositionEstimate {
    /// Smoothed horizontal offset from frame center, -100 (far left) to
    /// +100 (far right).
    pub offset_pct: f64,
    pub side: HorizontalSide,
}

/// Smooths per-face horizontal position over a sliding window.
///
/// Each face id keeps its own window, so one face jittering never
/// disturbs another's estimate. Stale ids must be swept with
/// [`cleanup_stale_faces`](Self::cleanup_stale_faces) or the map grows
/// without bound.
pub struct PositionTracker {
    frame_width: Option<u32>,
    window: usize,
    histories: HashMap<u32, VecDeque<f64>>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_SMOOTHING_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            frame_width: None,
            window: window.max(1),
            histories: HashMap::new(),
        }
    }

    pub fn set_frame_width(&mut self, width: u32) {
        self.frame_width = Some(width);
    }

    /// Folds one observation into the face's window and returns the
    /// smoothed estimate.
    pub fn update_position(
        &mut self,
        face_id: u32,
        bbox: &FaceBox,
    ) -> Result<PositionEstimate, EstimatorError> {
        let width = self.frame_width.ok_or(EstimatorError::FrameNotConfigured)?;
        let half = f64::from(width) / 2.0;
        let (cx, _) = bbox.center();
        let raw = ((cx - half) / half * 100.0).clamp(-100.0, 100.0);

        let history = self.histories.entry(face_id).or_default();
        history.push_back(raw);
        if history.len() > self.window {
            history.pop_front();
        }
        let offset_pct = history.iter().sum::<f64>() / history.len() as f64;

        let side = if offset_pct < 0.0 {
            HorizontalSide::Left
        } else {
            HorizontalSide::Right
        };

        Ok(PositionEstimate { offset_pct, side })
    }

    /// Drops smoothing windows for ids no longer tracked.
    pub fn cleanup_stale_faces(&mut self, active_ids: &[u32]) {
        self.histories.retain(|id, _| active_ids.contains(id));
    }

    pub fn tracked_faces(&self) -> usize {
        self.histories.len()
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}
