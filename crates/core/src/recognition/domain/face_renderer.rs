use crate::shared::frame::Frame;
use crate::shared::geometry::FaceBox;

/// Everything the overlay needs to draw for one face.
#[derive(Clone, Debug)]
pub struct FaceOverlay {
    pub bbox: FaceBox,
    pub label: String,
    pub confidence: f32,
    pub landmarks: Option<Vec<(f64, f64)>>,
}

/// Draws recognition overlays into a frame (in place, on a copy the
/// drawing pool already owns). Shared by drawing workers.
pub trait FaceRenderer: Send + Sync {
    fn render(
        &self,
        frame: &mut Frame,
        faces: &[FaceOverlay],
        show_landmarks: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
