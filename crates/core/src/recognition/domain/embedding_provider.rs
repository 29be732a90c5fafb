use crate::shared::frame::Frame;
use crate::shared::geometry::FaceBox;

/// One detected face: bounding box, identity embedding and detector score.
#[derive(Clone, Debug)]
pub struct FaceObservation {
    pub bbox: FaceBox,
    pub embedding: Vec<f32>,
    pub score: f32,
    /// Optional facial landmarks (frame coordinates), forwarded to the
    /// renderer when present.
    pub landmarks: Option<Vec<(f64, f64)>>,
}

/// Opaque face detection + embedding collaborator.
///
/// Implementations are shared by all detection pool workers, hence
/// `Send + Sync`; inference handles that are not thread-safe must do their
/// own internal locking.
pub trait EmbeddingProvider: Send + Sync {
    fn detect_faces(
        &self,
        frame: &Frame,
    ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error + Send + Sync>>;
}
