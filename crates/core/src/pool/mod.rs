pub mod detection_pool;
pub mod drawing_pool;
pub mod recognition_pool;
pub mod worker_pool;
