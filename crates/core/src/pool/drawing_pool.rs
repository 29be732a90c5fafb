use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::buffer::circular_buffer::CircularFrameBuffer;
use crate::pool::worker_pool::WorkerPool;
use crate::recognition::domain::face_renderer::{FaceOverlay, FaceRenderer};
use crate::shared::constants::{DEFAULT_DISPLAY_BUFFER_SIZE, DRAW_MIN_INTERVAL};
use crate::shared::frame::Frame;

/// A request to overlay recognition results on a frame copy.
#[derive(Clone, Debug)]
pub struct DrawRequest {
    pub frame: Frame,
    pub frame_id: u64,
    pub faces: Vec<FaceOverlay>,
    pub show_landmarks: bool,
}

/// Output of one drawing job. `frame` comes from the display ring buffer,
/// so it may be a slightly older frame than `frame_id` refers to (see
/// [`CircularFrameBuffer`] on the intentional smoothing delay).
#[derive(Clone, Debug)]
pub struct DrawResult {
    pub frame: Frame,
    pub frame_id: u64,
    pub processing_time: f64,
}

/// Worker pool rendering overlays, rate-limited at submission.
///
/// Requests arriving faster than the minimum inter-draw interval are
/// rejected outright rather than queued, so a slow renderer never
/// accumulates a backlog of stale frames.
pub struct DrawingPool {
    pool: WorkerPool<DrawRequest, DrawResult>,
    display_buffer: Arc<CircularFrameBuffer>,
    last_draw: Mutex<Option<Instant>>,
    min_interval: f64,
}

impl DrawingPool {
    pub fn new(num_workers: usize, renderer: Arc<dyn FaceRenderer>) -> Self {
        Self::with_buffer_size(num_workers, renderer, DEFAULT_DISPLAY_BUFFER_SIZE)
    }

    pub fn with_buffer_size(
        num_workers: usize,
        renderer: Arc<dyn FaceRenderer>,
        buffer_size: usize,
    ) -> Self {
        let display_buffer = Arc::new(CircularFrameBuffer::new(buffer_size));
        let worker_buffer = Arc::clone(&display_buffer);

        let pool = WorkerPool::new("drawing", num_workers, move |request: DrawRequest| {
            let start = Instant::now();
            let mut frame = request.frame;
            renderer.render(&mut frame, &request.faces, request.show_landmarks)?;
            worker_buffer.push_frame(frame);

            let display = worker_buffer
                .peek_frame()
                .ok_or("display buffer empty after push")?;
            Ok(DrawResult {
                frame: display,
                frame_id: request.frame_id,
                processing_time: start.elapsed().as_secs_f64(),
            })
        });

        Self {
            pool,
            display_buffer,
            last_draw: Mutex::new(None),
            min_interval: DRAW_MIN_INTERVAL,
        }
    }

    /// Submits a drawing request. Returns false when the request arrives
    /// inside the minimum inter-draw interval, the frame is empty, or the
    /// queue is full. Only an accepted request starts a new interval.
    pub fn process_frame(&self, request: DrawRequest) -> bool {
        if request.frame.is_empty() {
            log::warn!("drawing: empty frame in request, rejecting");
            return false;
        }

        let mut last = self.last_draw.lock().expect("draw interval lock poisoned");
        if let Some(t) = *last {
            if t.elapsed().as_secs_f64() < self.min_interval {
                return false;
            }
        }
        if self.pool.submit(request) {
            *last = Some(Instant::now());
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn last_draw_instant(&self) -> Option<Instant> {
        *self.last_draw.lock().expect("draw interval lock poisoned")
    }

    /// Non-blocking poll for one draw result.
    pub fn get_result(&self) -> Option<DrawResult> {
        self.pool.poll()
    }

    /// Oldest frame currently in the display ring, without consuming it.
    pub fn peek_display(&self) -> Option<Frame> {
        self.display_buffer.peek_frame()
    }

    pub fn shutdown(&mut self) {
        self.pool.shutdown();
        self.display_buffer.clear();
    }
}
