//! Heat layer raster.
//!
//! Each visible camera contributes a white radial gradient. Gradients are
//! composited with source-over onto a transparent buffer, then every pixel
//! whose coverage exceeds 1% is remapped to a grey of matching brightness
//! with its alpha compressed into `0..=140`. The result is drawn over the
//! map at a fixed opacity.

use citycam_geo_model::Point2D;

/// `(offset, alpha)` stops of a single camera's gradient.
pub const GRADIENT_STOPS: [(f64, f64); 4] = [(0.0, 0.55), (0.25, 0.2), (0.6, 0.06), (1.0, 0.0)];

/// Opacity the finished layer is drawn with.
pub const HEAT_OPACITY: f32 = 0.45;

/// Base gradient radius in pixels.
pub const HEAT_BASE_RADIUS: f64 = 65.0;

/// Amplitude of the radius pulse.
pub const HEAT_PULSE_AMPLITUDE: f64 = 8.0;

const REMAP_THRESHOLD: f32 = 0.01;
const REMAP_MAX_ALPHA: f32 = 140.0;

/// Gradient alpha at normalised distance `t` from the centre.
pub fn gradient_alpha(t: f64) -> f64 {
    if t <= 0.0 {
        return GRADIENT_STOPS[0].1;
    }
    for pair in GRADIENT_STOPS.windows(2) {
        let (t0, a0) = pair[0];
        let (t1, a1) = pair[1];
        if t <= t1 {
            return a0 + (a1 - a0) * (t - t0) / (t1 - t0);
        }
    }
    0.0
}

/// Viewport-sized RGBA8 heat raster.
#[derive(Debug, Clone, Default)]
pub struct HeatLayer {
    width: usize,
    height: usize,
    coverage: Vec<f32>,
    rgba: Vec<u8>,
}

impl HeatLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocate for a new surface size.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.coverage = vec![0.0; width * height];
        self.rgba = vec![0; width * height * 4];
    }

    /// Reset to fully transparent.
    pub fn clear(&mut self) {
        self.coverage.fill(0.0);
        self.rgba.fill(0);
    }

    /// Composite one gradient centred at `center`.
    pub fn splat(&mut self, center: Point2D, radius: f64) {
        if radius <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }
        let x0 = ((center.x - radius).floor().max(0.0)) as usize;
        let y0 = ((center.y - radius).floor().max(0.0)) as usize;
        let x1 = ((center.x + radius).ceil().min(self.width as f64)).max(0.0) as usize;
        let y1 = ((center.y + radius).ceil().min(self.height as f64)).max(0.0) as usize;

        for y in y0..y1 {
            let dy = y as f64 + 0.5 - center.y;
            let row = y * self.width;
            for x in x0..x1 {
                let dx = x as f64 + 0.5 - center.x;
                let t = (dx * dx + dy * dy).sqrt() / radius;
                if t >= 1.0 {
                    continue;
                }
                let a = gradient_alpha(t) as f32;
                let dst = &mut self.coverage[row + x];
                *dst = a + *dst * (1.0 - a);
            }
        }
    }

    /// Turn accumulated coverage into the displayed RGBA pixels.
    pub fn finish(&mut self) {
        for (px, &a) in self.rgba.chunks_exact_mut(4).zip(&self.coverage) {
            if a > REMAP_THRESHOLD {
                let grey = (a * 255.0).floor() as u8;
                px[0] = grey;
                px[1] = grey;
                px[2] = grey;
                px[3] = (a * REMAP_MAX_ALPHA).floor() as u8;
            } else {
                px.fill(0);
            }
        }
    }

    /// Finished RGBA8 pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.rgba
    }

    /// Accumulated coverage at a pixel.
    pub fn coverage_at(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.coverage[y * self.width + x])
    }
}
