//! Activity summaries for the dashboard's activity panel.

use citycam_geo_model::{Camera, CameraId};

use crate::scores::MotionScoreMap;

/// Coarse activity level across the shown cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    /// No shown camera has been scored yet.
    Scanning,
    Low,
    Medium,
    High,
}

impl ActivityLevel {
    pub fn from_mean(mean: Option<f64>) -> Self {
        match mean {
            None => ActivityLevel::Scanning,
            Some(m) if m > 0.5 => ActivityLevel::High,
            Some(m) if m > 0.2 => ActivityLevel::Medium,
            Some(_) => ActivityLevel::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActivityLevel::Scanning => "Scanning...",
            ActivityLevel::Low => "Low",
            ActivityLevel::Medium => "Medium",
            ActivityLevel::High => "High",
        }
    }
}

/// A scored camera in the summary's top list.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCamera {
    pub id: CameraId,
    pub name: String,
    pub score: f64,
}

/// Summary over a set of shown cameras.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySummary {
    /// Shown cameras with a score.
    pub scanned: usize,
    /// Shown cameras.
    pub total: usize,
    /// Mean score over scanned cameras.
    pub mean: Option<f64>,
    pub level: ActivityLevel,
    /// Up to three most active cameras, highest first.
    pub top: Vec<RankedCamera>,
}

impl ActivitySummary {
    /// Number of cameras listed in [`ActivitySummary::top`].
    pub const TOP_N: usize = 3;

    pub fn compute(shown: &[Camera], scores: &MotionScoreMap) -> Self {
        let mut ranked: Vec<RankedCamera> = shown
            .iter()
            .filter_map(|cam| {
                scores.get(cam.id).map(|score| RankedCamera {
                    id: cam.id,
                    name: cam.name.clone(),
                    score,
                })
            })
            .collect();

        let scanned = ranked.len();
        let mean = if scanned == 0 {
            None
        } else {
            Some(ranked.iter().map(|r| r.score).sum::<f64>() / scanned as f64)
        };

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(Self::TOP_N);

        Self {
            scanned,
            total: shown.len(),
            mean,
            level: ActivityLevel::from_mean(mean),
            top: ranked,
        }
    }
}

#[cfg(test)]
mod tests {
    use citycam_geo_model::Category;

    use super::*;

    fn cams() -> Vec<Camera> {
        (1..=5)
            .map(|i| Camera::new(i, format!("Cam {i}"), 37.87, 32.49, Category::Park))
            .collect()
    }

    #[test]
    fn test_nothing_scored_is_scanning() {
        let summary = ActivitySummary::compute(&cams(), &MotionScoreMap::new());
        assert_eq!(summary.level, ActivityLevel::Scanning);
        assert_eq!(summary.scanned, 0);
        assert_eq!(summary.total, 5);
        assert!(summary.top.is_empty());
    }

    #[test]
    fn test_top_three_sorted() {
        let scores = MotionScoreMap::new()
            .with_score(1, 0.25)
            .with_score(2, 0.75)
            .with_score(3, 0.375)
            .with_score(4, 0.625);
        let summary = ActivitySummary::compute(&cams(), &scores);
        assert_eq!(summary.scanned, 4);
        let ids: Vec<CameraId> = summary.top.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 4, 3]);
        assert_eq!(summary.mean, Some(0.5));
        assert_eq!(summary.level, ActivityLevel::Medium);
    }

    #[test]
    fn test_hidden_cameras_are_ignored() {
        let scores = MotionScoreMap::new().with_score(99, 1.0).with_score(1, 0.1);
        let summary = ActivitySummary::compute(&cams(), &scores);
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.level, ActivityLevel::Low);
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(ActivityLevel::from_mean(Some(0.5)), ActivityLevel::Medium);
        assert_eq!(ActivityLevel::from_mean(Some(0.51)), ActivityLevel::High);
        assert_eq!(ActivityLevel::from_mean(Some(0.2)), ActivityLevel::Low);
        assert_eq!(ActivityLevel::from_mean(Some(0.0)), ActivityLevel::Low);
    }
}
