pub mod attendance;
pub mod buffer;
pub mod camera;
pub mod estimator;
pub mod pipeline;
pub mod pool;
pub mod recognition;
pub mod shared;
pub mod tracking;
