use std::collections::{HashMap, HashSet};

use crate::attendance::ledger::AttendanceLedger;
use crate::attendance::presence_verifier::{FaceStatus, PresenceVerifier};
use crate::shared::constants::DEFAULT_AWAY_THRESHOLD;

/// Attendance state machine over verified sightings.
///
/// People move between two disjoint sets: `present` and `away`. A name
/// enters `present` (with an arrival record) once its face id passes
/// presence verification, whether it was previously unknown or away.
/// A present person unseen for longer than `away_threshold` seconds
/// moves to `away` with a departure record. A face id that drops out of
/// the visible set loses its verification progress, so a returning
/// person must dwell the full verification time again.
pub struct AttendanceLogger {
    verifier: PresenceVerifier,
    ledger: Box<dyn AttendanceLedger>,
    away_threshold: f64,
    present: HashSet<String>,
    away: HashSet<String>,
    last_seen: HashMap<String, f64>,
    face_names: HashMap<u32, String>,
}

impl AttendanceLogger {
    pub fn new(verifier: PresenceVerifier, ledger: Box<dyn AttendanceLedger>) -> Self {
        Self::with_away_threshold(verifier, ledger, DEFAULT_AWAY_THRESHOLD)
    }

    pub fn with_away_threshold(
        verifier: PresenceVerifier,
        ledger: Box<dyn AttendanceLedger>,
        away_threshold: f64,
    ) -> Self {
        Self {
            verifier,
            ledger,
            away_threshold,
            present: HashSet::new(),
            away: HashSet::new(),
            last_seen: HashMap::new(),
            face_names: HashMap::new(),
        }
    }

    /// Folds one tick's recognized faces (stable id to name) into the
    /// attendance state. `now` is seconds and must not decrease.
    pub fn update_presence(&mut self, visible: &HashMap<u32, String>, now: f64) {
        // Ids that vanished lose their dwell progress.
        let vanished: Vec<u32> = self
            .face_names
            .keys()
            .filter(|id| !visible.contains_key(id))
            .copied()
            .collect();
        for id in vanished {
            self.verifier.clear_face(id);
            self.face_names.remove(&id);
        }

        for (&face_id, name) in visible {
            self.face_names.insert(face_id, name.clone());
            self.verifier.update_face(face_id, now);
            self.last_seen.insert(name.clone(), now);

            if self.verifier.check_verification(face_id, now) {
                self.mark_present(name, now);
            }
        }

        // Present people unseen past the threshold depart.
        let departed: Vec<String> = self
            .present
            .iter()
            .filter(|name| {
                self.last_seen
                    .get(*name)
                    .map_or(true, |&seen| now - seen > self.away_threshold)
            })
            .cloned()
            .collect();
        for name in departed {
            self.present.remove(&name);
            self.away.insert(name.clone());
            self.ledger.record_departure(&name, now);
        }
    }

    fn mark_present(&mut self, name: &str, now: f64) {
        let was_away = self.away.remove(name);
        if self.present.insert(name.to_string()) || was_away {
            self.ledger.record_arrival(name, now);
        }
    }

    /// Comma-separated present and away name lists, "None" when empty.
    pub fn get_presence_status(&self) -> (String, String) {
        (join_names(&self.present), join_names(&self.away))
    }

    pub fn present_names(&self) -> Vec<String> {
        sorted(&self.present)
    }

    pub fn away_names(&self) -> Vec<String> {
        sorted(&self.away)
    }

    /// Seconds of dwell accumulated by a face id, if it is being watched.
    pub fn presence_time(&self, face_id: u32, now: f64) -> Option<f64> {
        self.verifier.presence_time(face_id, now)
    }

    /// Dwell progress of every watched face id.
    pub fn verification_statuses(&self, now: f64) -> HashMap<u32, FaceStatus> {
        self.verifier.all_statuses(now)
    }
}

fn sorted(names: &HashSet<String>) -> Vec<String> {
    let mut v: Vec<String> = names.iter().cloned().collect();
    v.sort();
    v
}

fn join_names(names: &HashSet<String>) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        sorted(names).join(", ")
    }
}
