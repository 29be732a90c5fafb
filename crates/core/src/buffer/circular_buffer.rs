use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::shared::frame::Frame;

/// Fixed-capacity frame ring for smooth display (triple buffering).
///
/// When full, pushing evicts the oldest frame. `peek_frame`/`pop_frame`
/// return the *oldest* buffered frame: the display intentionally lags by
/// up to `buffer_size` frames so a bursty producer never causes stutter.
///
/// All methods take `&self`; the buffer is internally synchronized and may
/// be shared across threads behind an `Arc`.
pub struct CircularFrameBuffer {
    inner: Mutex<Inner>,
    frame_ready: Condvar,
    buffer_size: usize,
}

struct Inner {
    frames: VecDeque<Frame>,
    last_push: Option<Instant>,
    /// Minimum interval between accepted pushes; `None` disables pacing.
    min_interval: Option<Duration>,
}

impl CircularFrameBuffer {
    /// `buffer_size` is clamped to at least 2 (double buffering).
    pub fn new(buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(2);
        Self {
            inner: Mutex::new(Inner {
                frames: VecDeque::with_capacity(buffer_size),
                last_push: None,
                min_interval: None,
            }),
            frame_ready: Condvar::new(),
            buffer_size,
        }
    }

    /// Enables pacing: pushes arriving faster than `fps` are rejected.
    pub fn set_target_fps(&self, fps: f64) {
        let mut inner = self.lock();
        inner.min_interval = if fps > 0.0 {
            Some(Duration::from_secs_f64(1.0 / fps))
        } else {
            None
        };
    }

    /// Adds a frame, evicting the oldest when full. Returns false when the
    /// frame is empty or arrives inside the pacing interval.
    pub fn push_frame(&self, frame: Frame) -> bool {
        if frame.is_empty() {
            return false;
        }

        let mut inner = self.lock();
        if let (Some(min), Some(last)) = (inner.min_interval, inner.last_push) {
            if last.elapsed() < min {
                return false;
            }
        }

        if inner.frames.len() >= self.buffer_size {
            inner.frames.pop_front();
        }
        inner.frames.push_back(frame);
        inner.last_push = Some(Instant::now());
        self.frame_ready.notify_all();
        true
    }

    /// Copy of the oldest buffered frame, without removing it.
    pub fn peek_frame(&self) -> Option<Frame> {
        self.lock().frames.front().cloned()
    }

    /// Removes and returns the oldest buffered frame.
    pub fn pop_frame(&self) -> Option<Frame> {
        self.lock().frames.pop_front()
    }

    pub fn clear(&self) {
        self.lock().frames.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.buffer_size
    }

    pub fn capacity(&self) -> usize {
        self.buffer_size
    }

    /// Blocks until at least one frame is buffered or `timeout` elapses.
    /// Returns true when a frame is available.
    pub fn wait_for_frame(&self, timeout: Duration) -> bool {
        let inner = self.lock();
        if !inner.frames.is_empty() {
            return true;
        }
        let (inner, result) = self
            .frame_ready
            .wait_timeout_while(inner, timeout, |i| i.frames.is_empty())
            .expect("frame buffer lock poisoned");
        !result.timed_out() && !inner.frames.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("frame buffer lock poisoned")
    }
}
