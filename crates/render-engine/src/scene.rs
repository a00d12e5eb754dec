//! Backend-neutral drawing primitives.
//!
//! The render loop emits a [`DrawCommand`] list per frame; a UI backend
//! replays it in order onto its surface. Coordinates are logical pixels
//! with the origin at the top-left of the map surface.

use citycam_geo_model::{MarkerShape, Point2D, TileKey};
use serde::Serialize;

/// Straight RGB with a floating-point alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// White at the given opacity, the dashboard's overlay colour.
    pub const fn white(a: f32) -> Self {
        Self {
            r: 255,
            g: 255,
            b: 255,
            a,
        }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Map background.
pub const BACKGROUND: Rgba = Rgba::rgb(0x08, 0x08, 0x08);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub width: f64,
    pub color: Rgba,
}

impl Stroke {
    pub const fn new(width: f64, color: Rgba) -> Self {
        Self { width, color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontWeight {
    Regular,
    Semibold,
    Bold,
}

/// A camera name in a rounded box above its marker.
///
/// The backend measures the text; the box spans the text width plus
/// `padding` on both sides and is `box_height` tall starting at `box_top`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSpec {
    pub text: String,
    /// Horizontal centre and text baseline.
    pub anchor: Point2D,
    pub box_top: f64,
    pub box_height: f64,
    pub padding: f64,
    pub corner_radius: f64,
    pub font_size: f32,
    pub weight: FontWeight,
    pub text_color: Rgba,
    pub box_fill: Rgba,
    pub box_stroke: Stroke,
}

/// One drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    /// Fill the whole surface.
    Clear { color: Rgba },
    /// Draw a ready tile image stretched to `rect`.
    Tile { key: TileKey, rect: Rect },
    Line {
        from: Point2D,
        to: Point2D,
        stroke: Stroke,
    },
    /// Alternating `dash[0]` on, `dash[1]` off.
    DashedLine {
        from: Point2D,
        to: Point2D,
        dash: [f64; 2],
        stroke: Stroke,
    },
    /// Draw the frame's heat raster over the whole surface.
    HeatLayer { opacity: f32 },
    Circle {
        center: Point2D,
        radius: f64,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    /// A closed polygon.
    Polygon {
        points: Vec<Point2D>,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    FillRect { rect: Rect, color: Rgba },
    Text {
        /// Horizontal centre and baseline.
        pos: Point2D,
        text: String,
        size: f32,
        weight: FontWeight,
        color: Rgba,
    },
    Label(LabelSpec),
}

/// Outline of a marker of the given shape and size.
///
/// Circles are returned as [`DrawCommand::Circle`], the other shapes as
/// polygons, so backends need no notion of marker shapes.
pub fn marker_outline(
    shape: MarkerShape,
    c: Point2D,
    r: f64,
    fill: Option<Rgba>,
    stroke: Option<Stroke>,
) -> DrawCommand {
    let p = Point2D::new;
    let points = match shape {
        MarkerShape::Circle => {
            return DrawCommand::Circle {
                center: c,
                radius: r,
                fill,
                stroke,
            }
        }
        MarkerShape::Diamond => vec![
            p(c.x, c.y - r),
            p(c.x + r, c.y),
            p(c.x, c.y + r),
            p(c.x - r, c.y),
        ],
        MarkerShape::Square => {
            let h = r * 0.8;
            vec![
                p(c.x - h, c.y - h),
                p(c.x + h, c.y - h),
                p(c.x + h, c.y + h),
                p(c.x - h, c.y + h),
            ]
        }
        MarkerShape::Triangle => vec![
            p(c.x, c.y - r),
            p(c.x + r, c.y + r * 0.7),
            p(c.x - r, c.y + r * 0.7),
        ],
    };
    DrawCommand::Polygon {
        points,
        fill,
        stroke,
    }
}
