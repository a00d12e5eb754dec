//! Spherical Web-Mercator projection.
//!
//! World pixel coordinates span `[0, S]` on both axes where
//! `S = 2^zoom * 256`. Screen positions are offsets from the view center's
//! world position, shifted to the middle of the viewport. Because the
//! center goes through the exact same arithmetic as any other point,
//! projecting the view center yields exactly `(w/2, h/2)`.

use std::f64::consts::PI;

use crate::view::{Point2D, ViewState, ViewportSize};

/// Edge length of one basemap tile at its native zoom.
pub const TILE_SIZE: f64 = 256.0;

/// World size in pixels at a (possibly fractional) zoom.
pub fn world_scale(zoom: f64) -> f64 {
    2f64.powf(zoom) * TILE_SIZE
}

fn mercator_y(lat: f64) -> f64 {
    (PI / 4.0 + lat * PI / 360.0).tan().ln()
}

/// World pixel position of a coordinate.
pub fn world_position(lng: f64, lat: f64, zoom: f64) -> Point2D {
    let scale = world_scale(zoom);
    Point2D {
        x: (lng + 180.0) / 360.0 * scale,
        y: (0.5 - mercator_y(lat) / (2.0 * PI)) * scale,
    }
}

/// Project a coordinate to a viewport pixel for the given view.
pub fn project(lng: f64, lat: f64, view: &ViewState, viewport: ViewportSize) -> Point2D {
    let point = world_position(lng, lat, view.zoom());
    let center = world_position(view.lng(), view.lat(), view.zoom());
    Point2D {
        x: point.x - center.x + viewport.width / 2.0,
        y: point.y - center.y + viewport.height / 2.0,
    }
}

/// Convert a pointer delta into a `(d_lng, d_lat)` pan delta.
///
/// Linear in world-scale units: dragging right moves the center west,
/// dragging down moves it north. Only deltas are needed while panning, so
/// this is not a Mercator inversion.
pub fn pan_delta(dx: f64, dy: f64, zoom: f64) -> (f64, f64) {
    let scale = world_scale(zoom);
    ((-dx / scale) * 360.0, (dy / scale) * 180.0)
}
