use std::sync::Mutex;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use crate::shared::frame::Frame;

/// Bounded producer/consumer frame handoff.
///
/// Backpressure policy: when the queue is full the incoming frame is
/// dropped (drop-newest); the producer is never blocked. Independently of
/// queue consumption, the most recently enqueued frame stays available via
/// [`current_frame`](Self::current_frame), so a slow consumer can always
/// render *something*.
pub struct HandoffBuffer {
    tx: Sender<Frame>,
    rx: Receiver<Frame>,
    current: Mutex<Option<Frame>>,
    capacity: usize,
}

impl HandoffBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            tx,
            rx,
            current: Mutex::new(None),
            capacity,
        }
    }

    /// Enqueues a copy of the frame. Returns false (and drops the frame)
    /// when it is empty or the queue is full.
    pub fn put_frame(&self, frame: &Frame) -> bool {
        if frame.is_empty() {
            return false;
        }
        match self.tx.try_send(frame.clone()) {
            Ok(()) => {
                *self.lock_current() = Some(frame.clone());
                true
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Removes and returns the next queued frame, oldest first.
    pub fn get_frame(&self) -> Option<Frame> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Copy of the most recently enqueued frame, regardless of what the
    /// consumer has drained.
    pub fn current_frame(&self) -> Option<Frame> {
        self.lock_current().clone()
    }

    pub fn clear(&self) {
        while self.rx.try_recv().is_ok() {}
        *self.lock_current() = None;
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rx.len() >= self.capacity
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<Frame>> {
        self.current.lock().expect("handoff current slot poisoned")
    }
}
