//! CityCam Motion Core
//!
//! Derives a bounded activity score per camera from decoded video frames:
//! - **Frames:** Fixed 80×45 RGB samples downsampled from decoded video
//! - **Differencer:** Fraction of changed pixels between two samples
//! - **Sampler:** Accumulates differences into one mean score per cycle
//! - **Scores:** The immutable camera → score map published after each cycle
//! - **Activity:** Read-only summaries over the score map
//!
//! This crate is pure computation — no I/O, no streaming dependencies.
//! All inputs are data; all outputs are data.

pub mod activity;
pub mod differ;
pub mod frame;
pub mod sampler;
pub mod scores;

pub use activity::{ActivityLevel, ActivitySummary};
pub use differ::frame_difference;
pub use frame::FrameSample;
pub use sampler::FrameSampler;
pub use scores::MotionScoreMap;
