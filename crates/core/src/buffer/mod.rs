pub mod circular_buffer;
pub mod handoff_buffer;
