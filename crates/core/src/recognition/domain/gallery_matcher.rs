/// Result of matching one embedding against the gallery.
///
/// `name` is `None` when no known identity scores above the matcher's
/// threshold; unknown faces are tracked but never fed to attendance.
#[derive(Clone, Debug)]
pub struct MatchOutcome {
    pub name: Option<String>,
    pub confidence: f32,
}

/// Opaque identity matcher over the reference-embedding gallery.
///
/// Shared by all recognition pool workers, hence `Send + Sync`.
pub trait GalleryMatcher: Send + Sync {
    fn match_embedding(
        &self,
        embedding: &[f32],
    ) -> Result<MatchOutcome, Box<dyn std::error::Error + Send + Sync>>;
}
