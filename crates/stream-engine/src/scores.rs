//! Single-writer publication of the motion score map.

use std::sync::Arc;

use citycam_geo_model::CameraId;
use citycam_motion_core::MotionScoreMap;
use tokio::sync::watch;

/// The only writer of the score map. Not `Clone`.
#[derive(Debug)]
pub struct ScorePublisher {
    tx: watch::Sender<Arc<MotionScoreMap>>,
}

/// A read handle returning the latest published map.
#[derive(Debug, Clone)]
pub struct ScoreReader {
    rx: watch::Receiver<Arc<MotionScoreMap>>,
}

/// Create the publisher and a first reader over an empty map.
pub fn score_channel() -> (ScorePublisher, ScoreReader) {
    let (tx, rx) = watch::channel(Arc::new(MotionScoreMap::new()));
    (ScorePublisher { tx }, ScoreReader { rx })
}

impl ScorePublisher {
    /// Replace one camera's score and publish the whole new map.
    pub fn publish(&self, camera: CameraId, score: f64) {
        self.tx.send_modify(|current| {
            *current = Arc::new(current.with_score(camera, score));
        });
    }

    /// Another reader of this publisher's map.
    pub fn subscribe(&self) -> ScoreReader {
        ScoreReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl ScoreReader {
    /// The latest committed map.
    pub fn snapshot(&self) -> Arc<MotionScoreMap> {
        Arc::clone(&self.rx.borrow())
    }

    /// Wait until a newer map is published. Errors once the publisher is gone.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}
