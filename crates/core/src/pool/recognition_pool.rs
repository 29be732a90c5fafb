use std::sync::Arc;
use std::time::Instant;

use crate::pool::worker_pool::WorkerPool;
use crate::recognition::domain::gallery_matcher::GalleryMatcher;

/// Output of one recognition job.
#[derive(Clone, Debug)]
pub struct RecognitionResult {
    /// Index of the face within its frame's detection set.
    pub face_id: usize,
    pub frame_id: u64,
    /// Stable identity id supplied by the caller; remains constant for the
    /// same physical face across frames (see the id allocator).
    pub persistent_id: u32,
    /// Recognized name, `None` when the gallery had no match.
    pub name: Option<String>,
    pub confidence: f32,
    pub processing_time: f64,
}

struct RecognitionJob {
    embedding: Vec<f32>,
    face_id: usize,
    frame_id: u64,
    persistent_id: u32,
}

/// Worker pool matching single-face embeddings against the gallery.
pub struct RecognitionPool {
    pool: WorkerPool<RecognitionJob, RecognitionResult>,
}

impl RecognitionPool {
    pub fn new(num_workers: usize, matcher: Arc<dyn GalleryMatcher>) -> Self {
        let pool = WorkerPool::new("recognition", num_workers, move |job: RecognitionJob| {
            let start = Instant::now();
            let outcome = matcher.match_embedding(&job.embedding)?;
            Ok(RecognitionResult {
                face_id: job.face_id,
                frame_id: job.frame_id,
                persistent_id: job.persistent_id,
                name: outcome.name,
                confidence: outcome.confidence,
                processing_time: start.elapsed().as_secs_f64(),
            })
        });
        Self { pool }
    }

    /// Submits one face embedding. Returns false when the embedding is
    /// empty or the queue is full (job dropped).
    pub fn process_face(
        &self,
        embedding: Vec<f32>,
        face_id: usize,
        frame_id: u64,
        persistent_id: u32,
    ) -> bool {
        if embedding.is_empty() {
            return false;
        }
        self.pool.submit(RecognitionJob {
            embedding,
            face_id,
            frame_id,
            persistent_id,
        })
    }

    /// Non-blocking poll for one recognition result.
    pub fn get_result(&self) -> Option<RecognitionResult> {
        self.pool.poll()
    }

    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::gallery_matcher::MatchOutcome;
    use std::time::Duration;

    /// Matches embeddings whose first component is above 0.5 as "alice".
    struct ThresholdMatcher;

    impl GalleryMatcher for ThresholdMatcher {
        fn match_embedding(
            &self,
            embedding: &[f32],
        ) -> Result<MatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
            if embedding[0] > 0.5 {
                Ok(MatchOutcome {
                    name: Some("alice".to_string()),
                    confidence: embedding[0],
                })
            } else {
                Ok(MatchOutcome {
                    name: None,
                    confidence: 0.0,
                })
            }
        }
    }

    fn await_result(pool: &RecognitionPool) -> RecognitionResult {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(r) = pool.get_result() {
                return r;
            }
            assert!(Instant::now() < deadline, "no result before deadline");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_known_face_recognized() {
        let pool = RecognitionPool::new(2, Arc::new(ThresholdMatcher));
        assert!(pool.process_face(vec![0.9, 0.1], 0, 42, 7));

        let result = await_result(&pool);
        assert_eq!(result.name.as_deref(), Some("alice"));
        assert_eq!(result.frame_id, 42);
        assert_eq!(result.persistent_id, 7);
        assert_eq!(result.face_id, 0);
    }

    #[test]
    fn test_unknown_face_has_no_name() {
        let pool = RecognitionPool::new(1, Arc::new(ThresholdMatcher));
        assert!(pool.process_face(vec![0.1], 1, 0, 3));
        let result = await_result(&pool);
        assert!(result.name.is_none());
    }

    #[test]
    fn test_empty_embedding_rejected() {
        let pool = RecognitionPool::new(1, Arc::new(ThresholdMatcher));
        assert!(!pool.process_face(Vec::new(), 0, 0, 0));
    }
}
