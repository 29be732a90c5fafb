pub mod camera_manager;
pub mod camera_source;
