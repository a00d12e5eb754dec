//! Input events delivered by the UI shell.

use citycam_geo_model::Point2D;
use serde::{Deserialize, Serialize};

/// Pointer and wheel input in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { pos: Point2D },
    Move { pos: Point2D },
    Up,
    /// The pointer left the map surface.
    Leave,
    /// Positive `delta_y` scrolls away from the user (zoom out).
    Wheel { delta_y: f64 },
}

/// Cursor the shell should show over the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorHint {
    #[default]
    Grab,
    Grabbing,
    Pointer,
}
