//! Downsampled RGB frame samples.
//!
//! Every sample is a fixed 80×45 grid regardless of the source aspect
//! ratio; the differencing threshold was tuned against this resolution.

/// Sample width in pixels.
pub const FRAME_WIDTH: usize = 80;

/// Sample height in pixels.
pub const FRAME_HEIGHT: usize = 45;

/// Bytes per sample pixel.
pub const CHANNELS: usize = 3;

/// Length of a packed sample buffer.
pub const FRAME_BYTES: usize = FRAME_WIDTH * FRAME_HEIGHT * CHANNELS;

/// A packed 80×45 RGB raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSample {
    data: Vec<u8>,
}

impl FrameSample {
    /// Wrap an already packed 80×45 RGB buffer.
    pub fn from_packed(data: Vec<u8>) -> Option<Self> {
        (data.len() == FRAME_BYTES).then_some(Self { data })
    }

    /// Copy an 80×45 RGB buffer whose rows are `stride` bytes apart
    /// (decoders pad rows to alignment boundaries).
    pub fn from_strided(data: &[u8], stride: usize) -> Option<Self> {
        let row_bytes = FRAME_WIDTH * CHANNELS;
        if stride < row_bytes || data.len() < stride * (FRAME_HEIGHT - 1) + row_bytes {
            return None;
        }
        let mut packed = Vec::with_capacity(FRAME_BYTES);
        for row in 0..FRAME_HEIGHT {
            let start = row * stride;
            packed.extend_from_slice(&data[start..start + row_bytes]);
        }
        Some(Self { data: packed })
    }

    /// A sample of one solid color.
    pub fn filled(rgb: [u8; 3]) -> Self {
        let data = rgb.iter().copied().cycle().take(FRAME_BYTES).collect();
        Self { data }
    }

    /// Packed RGB bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// RGB triplet at a grid position.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= FRAME_WIDTH || y >= FRAME_HEIGHT {
            return None;
        }
        let i = (y * FRAME_WIDTH + x) * CHANNELS;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Mutable access for synthesizing test and demo frames.
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= FRAME_WIDTH || y >= FRAME_HEIGHT {
            return;
        }
        let i = (y * FRAME_WIDTH + x) * CHANNELS;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }
}
