pub mod face_tracker;
pub mod identity;
pub mod motion_predictor;
pub mod object_tracker;
