use crate::shared::constants::{DETECTION_INTERVAL, PROCESSING_WIDTH};
use crate::shared::frame::Frame;
use crate::shared::geometry::FaceBox;
use crate::tracking::object_tracker::{ObjectTracker, PatchTracker};

pub type TrackerFactory = Box<dyn Fn() -> Box<dyn ObjectTracker> + Send>;

/// Alternates expensive detector passes with cheap tracker updates.
///
/// A full detection runs on the first frame and then every
/// `detection_interval` frames; in between, an [`ObjectTracker`] follows
/// the face. Every detector hit discards the old tracker and builds a
/// fresh one from the factory, so stale appearance templates never
/// survive a re-detection. All tracking runs on a frame downscaled to
/// [`PROCESSING_WIDTH`]; box coordinates in and out are full resolution.
pub struct FaceTracker {
    factory: TrackerFactory,
    tracker: Option<Box<dyn ObjectTracker>>,
    detection_interval: u64,
    frames_since_detection: u64,
}

impl FaceTracker {
    pub fn new() -> Self {
        Self::with_factory(Box::new(|| Box::new(PatchTracker::new())))
    }

    pub fn with_factory(factory: TrackerFactory) -> Self {
        Self {
            factory,
            tracker: None,
            detection_interval: DETECTION_INTERVAL,
            frames_since_detection: 0,
        }
    }

    /// True when the next frame should go through the full detector:
    /// either no tracker is active or the detection interval has elapsed.
    pub fn should_detect(&self) -> bool {
        self.tracker.is_none() || self.frames_since_detection >= self.detection_interval
    }

    /// Locks a fresh tracker onto a detector result (full-resolution box).
    pub fn initialize_tracking(&mut self, frame: &Frame, bbox: FaceBox) {
        let (small, scale) = frame.resize_to_width(PROCESSING_WIDTH);
        let mut tracker = (self.factory)();
        tracker.init(&small, bbox.scaled(scale));
        self.tracker = Some(tracker);
        self.frames_since_detection = 0;
    }

    /// Advances the tracker one frame. Returns the face box in
    /// full-resolution coordinates, or `None` once the target is lost
    /// (after which `should_detect` reports true).
    pub fn update(&mut self, frame: &Frame) -> Option<FaceBox> {
        let tracker = self.tracker.as_mut()?;
        self.frames_since_detection += 1;

        let (small, scale) = frame.resize_to_width(PROCESSING_WIDTH);
        match tracker.update(&small) {
            Some(bbox) => Some(bbox.scaled(1.0 / scale)),
            None => {
                self.tracker = None;
                None
            }
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.is_some()
    }
}

impl Default for FaceTracker {
    fn default() -> Self {
        Self::new()
    }
}
