//! Per-cycle score accumulation.

use crate::differ::frame_difference;
use crate::frame::FrameSample;

/// Accumulates frame differences for one camera cycle.
///
/// Each captured frame is compared with the previous capture; once the
/// required number of differences has been collected the mean is the
/// camera's score. A tick without a displayable frame contributes no
/// sample and clears the previous frame, so the next difference is taken
/// between two consecutive captures.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    required: usize,
    previous: Option<FrameSample>,
    sum: f64,
    count: usize,
}

impl FrameSampler {
    /// A sampler needing `required` differences (at least one).
    pub fn new(required: usize) -> Self {
        Self {
            required: required.max(1),
            previous: None,
            sum: 0.0,
            count: 0,
        }
    }

    /// Feed one sampling tick. Returns the mean once enough samples exist.
    pub fn push(&mut self, frame: Option<FrameSample>) -> Option<f64> {
        if frame.is_some() && self.previous.is_some() {
            let diff = frame_difference(self.previous.as_ref(), frame.as_ref());
            self.sum += diff;
            self.count += 1;
            tracing::trace!(diff, samples = self.count, "Frame difference sampled");
            if self.count >= self.required {
                return Some(self.sum / self.count as f64);
            }
        }
        self.previous = frame;
        None
    }

    /// Differences collected so far.
    pub fn samples(&self) -> usize {
        self.count
    }

    pub fn required(&self) -> usize {
        self.required
    }

    /// Forget everything, including the previous frame.
    pub fn reset(&mut self) {
        self.previous = None;
        self.sum = 0.0;
        self.count = 0;
    }
}
