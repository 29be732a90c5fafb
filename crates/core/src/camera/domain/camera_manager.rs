use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::camera::domain::camera_source::{CameraSource, CameraStatus};
use crate::shared::frame::Frame;

/// Pause after a failed read before polling the source again.
const READ_RETRY_DELAY: Duration = Duration::from_millis(100);

struct ManagedCamera {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// Owns one reader thread per camera and the latest frame from each.
///
/// A failed read never clears a camera's slot: consumers keep getting
/// the last good frame (as a defensive copy) until the source recovers
/// or the camera is removed.
pub struct CameraManager {
    frames: Arc<Mutex<HashMap<String, Frame>>>,
    statuses: Arc<Mutex<HashMap<String, CameraStatus>>>,
    cameras: HashMap<String, ManagedCamera>,
}

impl CameraManager {
    pub fn new() -> Self {
        Self {
            frames: Arc::new(Mutex::new(HashMap::new())),
            statuses: Arc::new(Mutex::new(HashMap::new())),
            cameras: HashMap::new(),
        }
    }

    /// Starts the source and spawns its reader thread. Returns false when
    /// the source fails to start, the name is already taken, or the
    /// thread cannot be spawned.
    pub fn add_camera(&mut self, name: &str, mut source: Box<dyn CameraSource>) -> bool {
        if self.cameras.contains_key(name) {
            log::warn!("camera {name}: already registered");
            return false;
        }
        if !source.start() {
            log::error!("camera {name}: failed to start");
            return false;
        }

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let frames = Arc::clone(&self.frames);
        let statuses = Arc::clone(&self.statuses);
        let camera_name = name.to_string();

        let spawned = std::thread::Builder::new()
            .name(format!("camera-{name}"))
            .spawn(move || {
                while thread_running.load(Ordering::Relaxed) {
                    match source.read_frame() {
                        Some(frame) => {
                            frames
                                .lock()
                                .expect("camera frame map lock poisoned")
                                .insert(camera_name.clone(), frame);
                        }
                        None => std::thread::sleep(READ_RETRY_DELAY),
                    }
                    statuses
                        .lock()
                        .expect("camera status map lock poisoned")
                        .insert(camera_name.clone(), source.status());
                }
                source.stop();
            });

        match spawned {
            Ok(handle) => {
                self.cameras.insert(
                    name.to_string(),
                    ManagedCamera {
                        running,
                        handle: Some(handle),
                    },
                );
                true
            }
            Err(e) => {
                log::error!("camera {name}: reader thread spawn failed: {e}");
                false
            }
        }
    }

    /// Latest frame from the camera, as an independent copy.
    pub fn get_frame(&self, name: &str) -> Option<Frame> {
        self.frames
            .lock()
            .expect("camera frame map lock poisoned")
            .get(name)
            .cloned()
    }

    pub fn status(&self, name: &str) -> Option<CameraStatus> {
        self.statuses
            .lock()
            .expect("camera status map lock poisoned")
            .get(name)
            .cloned()
    }

    /// Stops the camera's reader and forgets its frame and status.
    pub fn remove_camera(&mut self, name: &str) {
        if let Some(mut cam) = self.cameras.remove(name) {
            cam.running.store(false, Ordering::Relaxed);
            if let Some(handle) = cam.handle.take() {
                if handle.join().is_err() {
                    log::error!("camera {name}: reader thread panicked");
                }
            }
        }
        self.frames
            .lock()
            .expect("camera frame map lock poisoned")
            .remove(name);
        self.statuses
            .lock()
            .expect("camera status map lock poisoned")
            .remove(name);
    }

    pub fn camera_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cameras.keys().cloned().collect();
        names.sort();
        names
    }

    /// Stops every camera and clears all state.
    pub fn cleanup(&mut self) {
        let names = self.camera_names();
        for name in names {
            self.remove_camera(&name);
        }
    }
}

impl Default for CameraManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}
