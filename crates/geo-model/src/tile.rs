//! Basemap tile keys and the visible tile grid.
//!
//! Tiles only exist at whole zoom levels. At a fractional zoom the grid is
//! taken from `floor(zoom)` and each tile is stretched by
//! `2^(zoom - floor(zoom))`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::projection::{world_position, TILE_SIZE};
use crate::view::{ViewState, ViewportSize};

/// Cache key of a basemap tile. `x` is always wrapped into
/// `[0, 2^zoom)`, so two requests for the same wrapped column share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    /// Build a key, wrapping the column around the antimeridian.
    pub fn wrapped(zoom: u8, x: i64, y: u32) -> Self {
        let n = tiles_per_axis(zoom) as i64;
        Self {
            zoom,
            x: x.rem_euclid(n) as u32,
            y,
        }
    }

    /// `{z}/{x}/{y}` path fragment.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.zoom, self.x, self.y)
    }

    /// Expand a URL template containing `{z}`, `{x}` and `{y}`.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.zoom.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one axis at a zoom level.
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << zoom.min(31)
}

/// One grid cell to draw: which tile, and where on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileCell {
    pub key: TileKey,
    /// Top-left corner in viewport pixels.
    pub x: f64,
    pub y: f64,
    /// Edge length in viewport pixels after fractional-zoom stretching.
    pub size: f64,
}

/// The range of tiles covering a viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    pub tile_zoom: u8,
    /// `2^(zoom - floor(zoom))`.
    pub tile_scale: f64,
    /// Drawn tile edge in viewport pixels.
    pub tile_size: f64,
    pub start_x: i64,
    pub end_x: i64,
    pub start_y: i64,
    pub end_y: i64,
    center_x: f64,
    center_y: f64,
    viewport: ViewportSize,
}

impl TileGrid {
    /// Compute the tiles visible for a view. Columns are left unwrapped
    /// (they wrap in [`TileKey::wrapped`]); rows are clamped to the world.
    pub fn visible(view: &ViewState, viewport: ViewportSize) -> Self {
        let zoom = view.zoom();
        let tile_zoom = zoom.floor() as u8;
        let tile_scale = 2f64.powf(zoom - tile_zoom as f64);
        let tile_size = TILE_SIZE * tile_scale;
        let last_row = tiles_per_axis(tile_zoom) as i64 - 1;

        let center = world_position(view.lng(), view.lat(), zoom);
        let half_w = viewport.width / 2.0;
        let half_h = viewport.height / 2.0;

        Self {
            tile_zoom,
            tile_scale,
            tile_size,
            start_x: ((center.x - half_w) / tile_size).floor() as i64,
            end_x: ((center.x + half_w) / tile_size).ceil() as i64,
            start_y: (((center.y - half_h) / tile_size).floor() as i64).max(0),
            end_y: (((center.y + half_h) / tile_size).ceil() as i64).min(last_row),
            center_x: center.x,
            center_y: center.y,
            viewport,
        }
    }

    /// Every cell in the grid, row-major within each column.
    pub fn cells(&self) -> impl Iterator<Item = TileCell> + '_ {
        (self.start_x..=self.end_x).flat_map(move |tx| {
            (self.start_y..=self.end_y).map(move |ty| TileCell {
                key: TileKey::wrapped(self.tile_zoom, tx, ty as u32),
                x: tx as f64 * self.tile_size - self.center_x + self.viewport.width / 2.0,
                y: ty as f64 * self.tile_size - self.center_y + self.viewport.height / 2.0,
                size: self.tile_size,
            })
        })
    }

    pub fn cell_count(&self) -> usize {
        let cols = (self.end_x - self.start_x + 1).max(0) as usize;
        let rows = (self.end_y - self.start_y + 1).max(0) as usize;
        cols * rows
    }
}
