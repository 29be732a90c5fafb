use std::collections::HashMap;

use crate::shared::constants::ID_GRACE_FRAMES;
use crate::shared::geometry::FaceBox;

/// Minimum IoU for an overlap-based match between a track and a detection.
const IOU_MATCH_THRESHOLD: f64 = 0.3;
/// Fallback centroid-distance gate (pixels) when boxes no longer overlap.
const CENTROID_MATCH_DISTANCE: f64 = 100.0;
/// Detections below this score never open a new track.
const NEW_TRACK_SCORE: f32 = 0.5;

struct Track {
    bbox: FaceBox,
    last_seen: u64,
}

/// Hands out stable numeric identities to detected faces across frames.
///
/// Matching is greedy: detections are paired with existing tracks by
/// descending IoU, then leftover detections fall back to nearest-centroid
/// matching. Unmatched tracks survive a grace period of missed frames
/// before their id is retired; ids are never reused.
pub struct FaceIdAllocator {
    next_id: u32,
    tracks: HashMap<u32, Track>,
    grace_frames: u64,
}

impl Default for FaceIdAllocator {
    fn default() -> Self {
        Self::new(ID_GRACE_FRAMES)
    }
}

impl FaceIdAllocator {
    pub fn new(grace_frames: u64) -> Self {
        Self {
            next_id: 0,
            tracks: HashMap::new(),
            grace_frames,
        }
    }

    /// Associates one frame's detections with existing tracks.
    ///
    /// Returns one entry per detection: the matched or newly allocated id,
    /// or `None` for unmatched detections scoring below the new-track gate.
    /// `frame_index` must not decrease between calls.
    pub fn assign(&mut self, detections: &[(FaceBox, f32)], frame_index: u64) -> Vec<Option<u32>> {
        let mut assigned: Vec<Option<u32>> = vec![None; detections.len()];
        let mut free_tracks: Vec<u32> = self.tracks.keys().copied().collect();

        // Pass 1: greedy IoU pairing, best overlaps first.
        let mut pairs: Vec<(u32, usize, f64)> = Vec::new();
        for &id in &free_tracks {
            let track_box = &self.tracks[&id].bbox;
            for (det_idx, (bbox, _)) in detections.iter().enumerate() {
                let iou = track_box.iou(bbox);
                if iou >= IOU_MATCH_THRESHOLD {
                    pairs.push((id, det_idx, iou));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.total_cmp(&a.2));
        for (id, det_idx, _) in pairs {
            if assigned[det_idx].is_some() || !free_tracks.contains(&id) {
                continue;
            }
            assigned[det_idx] = Some(id);
            free_tracks.retain(|&t| t != id);
        }

        // Pass 2: nearest-centroid fallback for the leftovers.
        for (det_idx, (bbox, _)) in detections.iter().enumerate() {
            if assigned[det_idx].is_some() {
                continue;
            }
            let mut best: Option<(u32, f64)> = None;
            for &id in &free_tracks {
                let dist = self.tracks[&id].bbox.center_distance(bbox);
                if dist <= CENTROID_MATCH_DISTANCE
                    && best.map_or(true, |(_, best_dist)| dist < best_dist)
                {
                    best = Some((id, dist));
                }
            }
            if let Some((id, _)) = best {
                assigned[det_idx] = Some(id);
                free_tracks.retain(|&t| t != id);
            }
        }

        // Pass 3: confident unmatched detections open new tracks.
        for (det_idx, (_, score)) in detections.iter().enumerate() {
            if assigned[det_idx].is_none() && *score >= NEW_TRACK_SCORE {
                let id = self.next_id;
                self.next_id += 1;
                assigned[det_idx] = Some(id);
            }
        }

        // Refresh matched tracks, then retire anything unseen past grace.
        for (det_idx, id) in assigned.iter().enumerate() {
            if let Some(id) = id {
                self.tracks.insert(
                    *id,
                    Track {
                        bbox: detections[det_idx].0,
                        last_seen: frame_index,
                    },
                );
            }
        }
        let grace = self.grace_frames;
        self.tracks
            .retain(|_, track| frame_index.saturating_sub(track.last_seen) <= grace);

        assigned
    }

    /// Ids of tracks still inside their grace period.
    pub fn active_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.tracks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn last_bbox(&self, id: u32) -> Option<FaceBox> {
        self.tracks.get(&id).map(|t| t.bbox)
    }
}
