pub mod embedding_provider;
pub mod face_renderer;
pub mod gallery_matcher;
