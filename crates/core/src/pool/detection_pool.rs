use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::pool::worker_pool::WorkerPool;
use crate::recognition::domain::embedding_provider::{EmbeddingProvider, FaceObservation};
use crate::shared::frame::Frame;

/// Output of one detection job.
#[derive(Clone, Debug)]
pub struct DetectionResult {
    pub faces: Vec<FaceObservation>,
    /// Monotonically increasing per pool instance; the only safe key for
    /// correlating results across pools (emission order is unordered with
    /// more than one worker).
    pub frame_id: u64,
    pub processing_time: f64,
}

/// Worker pool running the embedding provider over whole frames.
pub struct DetectionPool {
    pool: WorkerPool<(u64, Frame), DetectionResult>,
    frame_counter: AtomicU64,
}

impl DetectionPool {
    pub fn new(num_workers: usize, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let pool = WorkerPool::new("detection", num_workers, move |(frame_id, frame): (u64, Frame)| {
            let start = Instant::now();
            let faces = provider.detect_faces(&frame)?;
            Ok(DetectionResult {
                faces,
                frame_id,
                processing_time: start.elapsed().as_secs_f64(),
            })
        });
        Self {
            pool,
            frame_counter: AtomicU64::new(0),
        }
    }

    /// Submits a copy of the frame for detection. Returns the assigned
    /// frame id, or `None` when the frame is empty or the input queue is
    /// full (backpressure drops the newest submission).
    pub fn process_frame(&self, frame: &Frame) -> Option<u64> {
        if frame.is_empty() {
            return None;
        }
        let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        if self.pool.submit((frame_id, frame.clone())) {
            Some(frame_id)
        } else {
            None
        }
    }

    /// Non-blocking poll for one detection result.
    pub fn get_result(&self) -> Option<DetectionResult> {
        self.pool.poll()
    }

    pub fn queued_jobs(&self) -> usize {
        self.pool.queued_jobs()
    }

    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::POOL_QUEUE_CAPACITY;
    use crate::shared::geometry::FaceBox;
    use std::collections::HashSet;
    use std::time::Duration;

    struct StubProvider;

    impl EmbeddingProvider for StubProvider {
        fn detect_faces(
            &self,
            frame: &Frame,
        ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(vec![FaceObservation {
                bbox: FaceBox::new(0.0, 0.0, frame.width() as f64, frame.height() as f64),
                embedding: vec![0.5; 8],
                score: 0.9,
                landmarks: None,
            }])
        }
    }

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn detect_faces(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error + Send + Sync>> {
            Err("inference backend unavailable".into())
        }
    }

    #[test]
    fn test_hundred_frames_four_workers_all_ids_unique() {
        let pool = DetectionPool::new(4, Arc::new(StubProvider));
        let frame = Frame::blank(16, 16, 0);

        let mut submitted: Vec<u64> = Vec::new();
        let mut results: Vec<DetectionResult> = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(10);

        // Cap in-flight jobs at the queue capacity so no submission or
        // result is ever dropped by backpressure.
        while results.len() < 100 && Instant::now() < deadline {
            if submitted.len() < 100 && submitted.len() - results.len() < POOL_QUEUE_CAPACITY {
                if let Some(id) = pool.process_frame(&frame) {
                    submitted.push(id);
                }
            }
            if let Some(result) = pool.get_result() {
                results.push(result);
            }
        }

        assert_eq!(submitted.len(), 100);
        assert_eq!(results.len(), 100);

        let submitted_ids: HashSet<u64> = submitted.iter().copied().collect();
        let result_ids: HashSet<u64> = results.iter().map(|r| r.frame_id).collect();
        assert_eq!(result_ids.len(), 100, "frame ids must be unique");
        assert_eq!(result_ids, submitted_ids);
    }

    #[test]
    fn test_frame_ids_monotonic() {
        let pool = DetectionPool::new(1, Arc::new(StubProvider));
        let frame = Frame::blank(8, 8, 0);
        let a = pool.process_frame(&frame).unwrap();
        let b = pool.process_frame(&frame).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_empty_frame_rejected() {
        let pool = DetectionPool::new(1, Arc::new(StubProvider));
        assert!(pool.process_frame(&Frame::new(Vec::new(), 0, 0, 3, 0)).is_none());
    }

    #[test]
    fn test_provider_failure_drops_job_pool_survives() {
        let pool = DetectionPool::new(1, Arc::new(FailingProvider));
        let frame = Frame::blank(8, 8, 0);
        assert!(pool.process_frame(&frame).is_some());
        std::thread::sleep(Duration::from_millis(50));
        assert!(pool.get_result().is_none());
        // Pool still accepts work after the failure.
        assert!(pool.process_frame(&frame).is_some());
    }

    #[test]
    fn test_result_carries_faces_and_timing() {
        let pool = DetectionPool::new(1, Arc::new(StubProvider));
        let frame = Frame::blank(32, 24, 0);
        let id = pool.process_frame(&frame).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let result = loop {
            if let Some(r) = pool.get_result() {
                break r;
            }
            assert!(Instant::now() < deadline, "no result before deadline");
            std::thread::sleep(Duration::from_millis(1));
        };

        assert_eq!(result.frame_id, id);
        assert_eq!(result.faces.len(), 1);
        assert!(result.processing_time >= 0.0);
    }
}
