//! Frame differencing.

use crate::frame::{FrameSample, FRAME_HEIGHT, FRAME_WIDTH};

/// Mean per-channel brightness change above which a pixel counts as changed.
pub const BRIGHTNESS_DELTA_THRESHOLD: u32 = 25;

/// Amplification of the changed-pixel fraction; a quarter of the frame
/// changing saturates the score.
pub const CHANGE_GAIN: f64 = 4.0;

/// Activity between two samples in `[0, 1]`.
///
/// A pixel changes when the mean absolute difference of its three
/// channels exceeds [`BRIGHTNESS_DELTA_THRESHOLD`]. The score is
/// `min(1, changed / total * 4)`. Missing frames score 0.
pub fn frame_difference(prev: Option<&FrameSample>, curr: Option<&FrameSample>) -> f64 {
    let (Some(prev), Some(curr)) = (prev, curr) else {
        return 0.0;
    };

    // (dR + dG + dB) / 3 > 25  <=>  dR + dG + dB > 75
    let limit = BRIGHTNESS_DELTA_THRESHOLD * 3;
    let changed = prev
        .as_bytes()
        .chunks_exact(3)
        .zip(curr.as_bytes().chunks_exact(3))
        .filter(|(a, b)| {
            let delta: u32 = a
                .iter()
                .zip(b.iter())
                .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs())
                .sum();
            delta > limit
        })
        .count();

    let total = (FRAME_WIDTH * FRAME_HEIGHT) as f64;
    (changed as f64 / total * CHANGE_GAIN).min(1.0)
}
