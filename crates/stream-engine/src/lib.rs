//! CityCam Stream Engine
//!
//! Turns live camera streams into activity scores, one camera at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  MotionScheduler                      │
//! │                                                       │
//! │  Attach ──► Sampling ──► Scored ──┐                   │
//! │    │            │                 ├──► Cooldown ──┐   │
//! │    └──► Skipped ◄── decode error ─┘               │   │
//! │    ▲                                              │   │
//! │    └──────────── next camera (mod n) ◄────────────┘   │
//! │                                                       │
//! │  DecodeSession (HLS → 80×45 RGB)    ScorePublisher    │
//! └─────────────┬──────────────────────────────┬──────────┘
//!               │                              │
//!               ▼                              ▼
//!      /stream/l/{id}/master.m3u8     watch<Arc<MotionScoreMap>>
//! ```
//!
//! The scheduler keeps exactly one decode session open at any time. The
//! [`LivePlayer`] preview of the selected camera runs beside it with its
//! own single session.

pub mod pipeline;
pub mod player;
pub mod scheduler;
pub mod scores;

pub use pipeline::{DecodeSession, GstStreamSource, StreamEndpoint, StreamSource};
pub use player::{GstPreviewSource, LivePlayer, PlayerStatus, PreviewFrame};
pub use scheduler::*;
pub use scores::{score_channel, ScorePublisher, ScoreReader};
