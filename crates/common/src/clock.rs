//! Animation timing for the render loop.
//!
//! The dashboard animates pulsing rings and the heat radius from a single
//! phase value that advances once per rendered frame, so the animation
//! speed follows the display refresh rate rather than wall time.

use std::f64::consts::TAU;

/// Phase advance per rendered frame, in radians.
pub const PULSE_STEP: f64 = 0.02;

/// A wrapping animation phase in `[0, 2π)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PulseClock {
    phase: f64,
}

impl PulseClock {
    /// Start a clock at phase zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Advance by one frame.
    pub fn advance(&mut self) {
        self.phase = (self.phase + PULSE_STEP) % TAU;
    }

    /// `sin(phase * rate + offset)`, the building block of every pulse.
    pub fn wave(&self, rate: f64, offset: f64) -> f64 {
        (self.phase * rate + offset).sin()
    }
}
