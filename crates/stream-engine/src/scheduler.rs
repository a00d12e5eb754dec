//! Rotating motion sampling scheduler.
//!
//! Visits cameras one at a time in registry order. Each visit attaches to
//! the camera's stream, waits one sample interval between captures, and
//! publishes the mean frame difference once enough captures have been
//! compared. The rotation never stalls: a camera without a stream, a
//! failed attach or a decode error all move on to the next camera after
//! the cooldown.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use citycam_common::config::MotionConfig;
use citycam_geo_model::{CameraId, CameraRegistry};
use citycam_motion_core::FrameSampler;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::pipeline::{DecodeSession, StreamEndpoint, StreamSource};
use crate::scores::ScorePublisher;

/// Timing and sampling parameters for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub stream_base_url: String,
    pub sample_interval: Duration,
    pub cooldown: Duration,
    pub samples_per_cycle: usize,
    pub max_sampling_ticks: Option<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&MotionConfig::default())
    }
}

impl From<&MotionConfig> for SchedulerConfig {
    fn from(cfg: &MotionConfig) -> Self {
        Self {
            stream_base_url: cfg.stream_base_url.clone(),
            sample_interval: Duration::from_millis(cfg.sample_interval_ms.max(1)),
            cooldown: Duration::from_millis(cfg.cooldown_ms),
            samples_per_cycle: cfg.samples_per_cycle.max(1),
            max_sampling_ticks: cfg.max_sampling_ticks,
        }
    }
}

/// Where the scheduler currently is within a camera visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Attach,
    Sampling,
    Scored,
    Skipped,
    Cooldown,
}

/// Index into the registry, advancing modulo its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationCursor {
    index: usize,
    len: usize,
}

impl RotationCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Move to the next camera, wrapping at the end.
    pub fn advance(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
        self.index
    }
}

/// Why a camera visit produced no score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The camera has no stream identifier.
    NoStream,
    /// The stream never produced enough frames.
    Stalled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Scored { score: f64 },
    Skipped(SkipReason),
    Failed { error: String },
}

/// Result of one camera visit.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub index: usize,
    pub camera_id: CameraId,
    pub outcome: CycleOutcome,
}

/// Closes the wrapped session when dropped, including on cancellation.
struct SessionGuard(Box<dyn DecodeSession>);

impl Deref for SessionGuard {
    type Target = dyn DecodeSession;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.0.is_open() {
            if let Err(e) = self.0.close() {
                tracing::warn!(error = %e, "Failed to close stream session");
            }
        }
    }
}

pub struct MotionScheduler {
    registry: Arc<CameraRegistry>,
    source: Box<dyn StreamSource>,
    config: SchedulerConfig,
    cursor: RotationCursor,
    publisher: ScorePublisher,
    phase: CyclePhase,
}

impl MotionScheduler {
    pub fn new(
        registry: Arc<CameraRegistry>,
        source: Box<dyn StreamSource>,
        config: SchedulerConfig,
        publisher: ScorePublisher,
    ) -> Self {
        let cursor = RotationCursor::new(registry.len());
        Self {
            registry,
            source,
            config,
            cursor,
            publisher,
            phase: CyclePhase::Attach,
        }
    }

    pub fn cursor(&self) -> RotationCursor {
        self.cursor
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Visit the camera under the cursor, cool down, then advance.
    ///
    /// Returns `None` when the registry is empty.
    pub async fn next_cycle(&mut self) -> Option<CycleReport> {
        if self.registry.is_empty() {
            return None;
        }
        let report = self.visit().await;
        self.phase = CyclePhase::Cooldown;
        time::sleep(self.config.cooldown).await;
        self.cursor.advance();
        self.phase = CyclePhase::Attach;
        Some(report)
    }

    async fn visit(&mut self) -> CycleReport {
        self.phase = CyclePhase::Attach;
        let index = self.cursor.index();
        let registry = Arc::clone(&self.registry);
        let camera = &registry.cameras()[index];
        let report = |outcome| CycleReport {
            index,
            camera_id: camera.id,
            outcome,
        };

        let Some(stream_id) = registry.stream_id(camera.id) else {
            self.phase = CyclePhase::Skipped;
            return report(CycleOutcome::Skipped(SkipReason::NoStream));
        };
        let endpoint =
            StreamEndpoint::resolve(&self.config.stream_base_url, camera.id, stream_id);

        let mut session = match self.source.open(&endpoint) {
            Ok(session) => SessionGuard(session),
            Err(e) => {
                self.phase = CyclePhase::Skipped;
                return report(CycleOutcome::Failed {
                    error: e.to_string(),
                });
            }
        };

        self.phase = CyclePhase::Sampling;
        let period = self.config.sample_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sampler = FrameSampler::new(self.config.samples_per_cycle);
        let mut ticks = 0u32;

        loop {
            ticker.tick().await;
            ticks += 1;

            let frame = match session.poll_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    self.phase = CyclePhase::Skipped;
                    return report(CycleOutcome::Failed {
                        error: e.to_string(),
                    });
                }
            };

            if let Some(mean) = sampler.push(frame) {
                let score = mean.clamp(0.0, 1.0);
                self.publisher.publish(camera.id, score);
                self.phase = CyclePhase::Scored;
                return report(CycleOutcome::Scored { score });
            }

            if self.config.max_sampling_ticks.is_some_and(|max| ticks >= max) {
                self.phase = CyclePhase::Skipped;
                return report(CycleOutcome::Skipped(SkipReason::Stalled));
            }
        }
    }

    /// Rotate until `shutdown` turns true or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        if self.registry.is_empty() {
            tracing::info!("No cameras registered; motion sampling idle");
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            return;
        }

        tracing::info!(
            cameras = self.registry.len(),
            interval_ms = self.config.sample_interval.as_millis() as u64,
            "Motion sampling started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                report = self.next_cycle() => {
                    if let Some(report) = report {
                        log_report(&report);
                    }
                }
            }
        }

        tracing::info!("Motion sampling stopped");
    }

    /// Run on the current tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        SchedulerHandle { shutdown, task }
    }
}

fn log_report(report: &CycleReport) {
    match &report.outcome {
        CycleOutcome::Scored { score } => {
            tracing::info!(camera = report.camera_id, score, "Camera scored");
        }
        CycleOutcome::Skipped(reason) => {
            tracing::debug!(camera = report.camera_id, ?reason, "Camera skipped");
        }
        CycleOutcome::Failed { error } => {
            tracing::warn!(camera = report.camera_id, %error, "Camera sampling failed");
        }
    }
}

/// Owner of a spawned scheduler.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the scheduler and wait until its session is closed.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Motion scheduler task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
