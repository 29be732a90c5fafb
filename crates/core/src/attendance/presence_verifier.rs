use std::collections::{HashMap, HashSet};

use crate::shared::constants::DEFAULT_VERIFICATION_TIME;

/// Dwell progress of one watched face.
#[derive(Clone, Copy, Debug)]
pub struct FaceStatus {
    /// Seconds since the face was first seen.
    pub presence_time: f64,
    pub verified: bool,
}

/// Debounces face sightings into verified presence.
///
/// A face id must dwell continuously for `verification_time` seconds
/// before it verifies; a reset restarts the dwell from the next sighting.
/// Timestamps are seconds as f64 and must not decrease per face.
pub struct PresenceVerifier {
    verification_time: f64,
    first_seen: HashMap<u32, f64>,
    verified: HashSet<u32>,
}

impl PresenceVerifier {
    pub fn new(verification_time: f64) -> Self {
        Self {
            verification_time,
            first_seen: HashMap::new(),
            verified: HashSet::new(),
        }
    }

    /// Records a sighting; the first one starts the dwell clock.
    pub fn update_face(&mut self, face_id: u32, now: f64) {
        self.first_seen.entry(face_id).or_insert(now);
    }

    /// True once the face has dwelled long enough. Verification latches
    /// until reset or cleared.
    pub fn check_verification(&mut self, face_id: u32, now: f64) -> bool {
        if self.verified.contains(&face_id) {
            return true;
        }
        match self.first_seen.get(&face_id) {
            Some(&start) if now - start >= self.verification_time => {
                self.verified.insert(face_id);
                true
            }
            _ => false,
        }
    }

    /// Seconds since the face was first seen, if it is being watched.
    pub fn presence_time(&self, face_id: u32, now: f64) -> Option<f64> {
        self.first_seen.get(&face_id).map(|&start| now - start)
    }

    /// Dwell progress for every watched face.
    pub fn all_statuses(&self, now: f64) -> HashMap<u32, FaceStatus> {
        self.first_seen
            .iter()
            .map(|(&id, &start)| {
                (
                    id,
                    FaceStatus {
                        presence_time: now - start,
                        verified: self.verified.contains(&id),
                    },
                )
            })
            .collect()
    }

    /// Unverifies the face and restarts its dwell at the next sighting.
    pub fn reset_verification(&mut self, face_id: u32) {
        self.verified.remove(&face_id);
        self.first_seen.remove(&face_id);
    }

    /// Forgets the face entirely.
    pub fn clear_face(&mut self, face_id: u32) {
        self.reset_verification(face_id);
    }

    pub fn is_verified(&self, face_id: u32) -> bool {
        self.verified.contains(&face_id)
    }
}

impl Default for PresenceVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_VERIFICATION_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_face_verifies_after_dwell() {
        // A face appearing at t=0 must not verify before 10s of dwell.
        let mut v = PresenceVerifier::new(10.0);
        v.update_face(1, 0.0);
        assert!(!v.check_verification(1, 0.0));
        assert!(!v.check_verification(1, 9.9));
        assert!(v.check_verification(1, 10.0));
        assert!(v.is_verified(1));
    }

    #[test]
    fn test_verification_latches() {
        let mut v = PresenceVerifier::new(5.0);
        v.update_face(1, 0.0);
        assert!(v.check_verification(1, 6.0));
        // Later checks stay verified even if asked about an earlier time.
        assert!(v.check_verification(1, 6.1));
    }

    #[test]
    fn test_reset_restarts_dwell() {
        let mut v = PresenceVerifier::new(5.0);
        v.update_face(1, 0.0);
        assert!(v.check_verification(1, 5.0));

        v.reset_verification(1);
        assert!(!v.check_verification(1, 6.0));
        v.update_face(1, 6.0);
        assert!(!v.check_verification(1, 10.0));
        assert!(v.check_verification(1, 11.0));
    }

    #[test]
    fn test_presence_time_tracks_dwell() {
        let mut v = PresenceVerifier::new(10.0);
        v.update_face(3, 2.0);
        assert_relative_eq!(v.presence_time(3, 8.5).unwrap(), 6.5);
        assert!(v.presence_time(4, 8.5).is_none());
    }

    #[test]
    fn test_repeat_sightings_keep_original_start() {
        let mut v = PresenceVerifier::new(10.0);
        v.update_face(1, 0.0);
        v.update_face(1, 5.0);
        v.update_face(1, 9.0);
        assert!(v.check_verification(1, 10.0));
    }

    #[test]
    fn test_all_statuses_reports_every_watched_face() {
        let mut v = PresenceVerifier::new(5.0);
        v.update_face(1, 0.0);
        v.update_face(2, 4.0);
        assert!(v.check_verification(1, 6.0));

        let statuses = v.all_statuses(6.0);
        assert_eq!(statuses.len(), 2);
        assert_relative_eq!(statuses[&1].presence_time, 6.0);
        assert!(statuses[&1].verified);
        assert_relative_eq!(statuses[&2].presence_time, 2.0);
        assert!(!statuses[&2].verified);

        v.clear_face(2);
        assert!(!v.all_statuses(7.0).contains_key(&2));
    }

    #[test]
    fn test_faces_are_independent() {
        let mut v = PresenceVerifier::new(10.0);
        v.update_face(1, 0.0);
        v.update_face(2, 8.0);
        assert!(v.check_verification(1, 12.0));
        assert!(!v.check_verification(2, 12.0));
    }
}
