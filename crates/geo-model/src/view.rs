//! Map view state and viewport geometry.

use serde::{Deserialize, Serialize};

/// Lowest zoom the dashboard allows.
pub const MIN_ZOOM: f64 = 12.0;

/// Highest zoom the dashboard allows.
pub const MAX_ZOOM: f64 = 18.0;

/// Latitude limit of the square Web-Mercator world.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Center and zoom of the map.
///
/// Zoom is always within `[MIN_ZOOM, MAX_ZOOM]`; every constructor and
/// mutator clamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    lat: f64,
    lng: f64,
    zoom: f64,
}

impl ViewState {
    /// Create a view, clamping zoom (and latitude) into range.
    pub fn new(lat: f64, lng: f64, zoom: f64) -> Self {
        Self {
            lat: lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT),
            lng,
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Move the center.
    pub fn set_center(&mut self, lat: f64, lng: f64) {
        self.lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        self.lng = lng;
    }

    /// Set zoom, clamped into range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    /// Adjust zoom by a delta, clamped into range.
    pub fn zoom_by(&mut self, delta: f64) {
        self.set_zoom(self.zoom + delta);
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Size of the drawing surface in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Nothing can be drawn into a zero-area surface.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Center pixel (the crosshair position).
    pub fn center(&self) -> Point2D {
        Point2D::new(self.width / 2.0, self.height / 2.0)
    }
}

/// A 2D pixel point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_clamped_on_construction() {
        assert_eq!(ViewState::new(0.0, 0.0, 3.0).zoom(), MIN_ZOOM);
        assert_eq!(ViewState::new(0.0, 0.0, 30.0).zoom(), MAX_ZOOM);
        assert_eq!(ViewState::new(0.0, 0.0, f64::NAN).zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_zoom_by_stays_in_range() {
        let mut view = ViewState::new(37.87, 32.49, 17.9);
        view.zoom_by(0.3);
        assert_eq!(view.zoom(), MAX_ZOOM);
        view.zoom_by(-100.0);
        assert_eq!(view.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_viewport_center() {
        let vp = ViewportSize::new(800.0, 600.0);
        assert_eq!(vp.center(), Point2D::new(400.0, 300.0));
        assert!(ViewportSize::new(0.0, 600.0).is_empty());
    }

    #[test]
    fn test_point2d_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
    }
}
