//! The camera → activity score map.
//!
//! The map is immutable; a writer derives a new map with one camera's
//! score replaced and publishes the whole value, so readers never observe
//! a half-updated cycle.

use std::collections::BTreeMap;

use citycam_geo_model::CameraId;
use serde::Serialize;

/// Scores in `[0, 1]` keyed by camera. Absent cameras are unscored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MotionScoreMap {
    scores: BTreeMap<CameraId, f64>,
}

impl MotionScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of this map with `camera`'s score replaced.
    ///
    /// Scores are clamped into `[0, 1]`; NaN is stored as 0.
    pub fn with_score(&self, camera: CameraId, score: f64) -> Self {
        let mut scores = self.scores.clone();
        scores.insert(camera, clamp_score(score));
        Self { scores }
    }

    /// Score for a camera, `None` when it has never been scored.
    pub fn get(&self, camera: CameraId) -> Option<f64> {
        self.scores.get(&camera).copied()
    }

    pub fn is_scored(&self, camera: CameraId) -> bool {
        self.scores.contains_key(&camera)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CameraId, f64)> + '_ {
        self.scores.iter().map(|(&id, &score)| (id, score))
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscored_is_none() {
        let map = MotionScoreMap::new();
        assert_eq!(map.get(7), None);
        assert!(!map.is_scored(7));
    }

    #[test]
    fn test_zero_is_a_score() {
        let map = MotionScoreMap::new().with_score(7, 0.0);
        assert_eq!(map.get(7), Some(0.0));
        assert!(map.is_scored(7));
    }

    #[test]
    fn test_replacement_leaves_original_untouched() {
        let first = MotionScoreMap::new().with_score(1, 0.3);
        let second = first.with_score(1, 0.8).with_score(2, 0.1);
        assert_eq!(first.get(1), Some(0.3));
        assert_eq!(first.len(), 1);
        assert_eq!(second.get(1), Some(0.8));
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let map = MotionScoreMap::new()
            .with_score(1, 1.7)
            .with_score(2, -0.2)
            .with_score(3, f64::NAN);
        assert_eq!(map.get(1), Some(1.0));
        assert_eq!(map.get(2), Some(0.0));
        assert_eq!(map.get(3), Some(0.0));
    }

    #[test]
    fn test_serializes_as_object() {
        let map = MotionScoreMap::new().with_score(2, 0.5);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"scores":{"2":0.5}}"#);
    }
}
