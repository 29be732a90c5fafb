pub mod engine;
pub mod pipeline_logger;
