//! Replays render-engine display lists with egui.
//!
//! egui has no shadow blur, so marker glows are not reproduced, and it
//! ships a single proportional font, so label weights only change colour
//! and size.

use std::collections::HashMap;

use citycam_geo_model::{Point2D, TileKey};
use citycam_render_engine::heat::HeatLayer;
use citycam_render_engine::scene::{DrawCommand, LabelSpec, Rgba, Stroke};
use citycam_render_engine::tiles::TileCache;
use eframe::egui::{self, pos2, vec2, Color32, FontId, Pos2, Rect, TextureHandle, TextureOptions};

const FULL_UV: Rect = Rect {
    min: Pos2 { x: 0.0, y: 0.0 },
    max: Pos2 { x: 1.0, y: 1.0 },
};

/// Share of the font size above the baseline.
const ASCENT: f32 = 0.8;

/// GPU copies of tiles and the heat raster.
#[derive(Default)]
pub struct MapTextures {
    tiles: HashMap<TileKey, TextureHandle>,
    heat: Option<TextureHandle>,
}

impl MapTextures {
    /// Upload the latest heat raster.
    pub fn sync_heat(&mut self, ctx: &egui::Context, heat: &HeatLayer) {
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [heat.width(), heat.height()],
            heat.pixels(),
        );
        match &mut self.heat {
            Some(handle) => handle.set(image, TextureOptions::LINEAR),
            None => {
                self.heat = Some(ctx.load_texture("heat-layer", image, TextureOptions::LINEAR))
            }
        }
    }

    fn tile(&mut self, ctx: &egui::Context, key: TileKey, cache: &TileCache) -> Option<egui::TextureId> {
        if let Some(handle) = self.tiles.get(&key) {
            return Some(handle.id());
        }
        let image = cache.peek(&key)?.image()?;
        let color = egui::ColorImage::from_rgba_unmultiplied(
            [image.width as usize, image.height as usize],
            &image.rgba,
        );
        let handle = ctx.load_texture(format!("tile-{key}"), color, TextureOptions::LINEAR);
        let id = handle.id();
        self.tiles.insert(key, handle);
        Some(id)
    }
}

pub fn color(c: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (c.a.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn stroke(s: Stroke) -> egui::Stroke {
    egui::Stroke::new(s.width as f32, color(s.color))
}

fn at(origin: Pos2, p: Point2D) -> Pos2 {
    pos2(origin.x + p.x as f32, origin.y + p.y as f32)
}

/// Paint one frame into `rect`.
pub fn paint(
    painter: &egui::Painter,
    rect: Rect,
    commands: &[DrawCommand],
    textures: &mut MapTextures,
    tiles: &TileCache,
) {
    let origin = rect.min;
    let painter = painter.with_clip_rect(rect);

    for command in commands {
        match command {
            DrawCommand::Clear { color: c } => {
                painter.rect_filled(rect, 0.0, color(*c));
            }
            DrawCommand::Tile { key, rect: r } => {
                if let Some(id) = textures.tile(painter.ctx(), *key, tiles) {
                    let dest = Rect::from_min_size(
                        at(origin, Point2D::new(r.x, r.y)),
                        vec2(r.width as f32, r.height as f32),
                    );
                    painter.image(id, dest, FULL_UV, Color32::WHITE);
                }
            }
            DrawCommand::Line { from, to, stroke: s } => {
                painter.line_segment([at(origin, *from), at(origin, *to)], stroke(*s));
            }
            DrawCommand::DashedLine {
                from,
                to,
                dash,
                stroke: s,
            } => {
                painter.extend(egui::Shape::dashed_line(
                    &[at(origin, *from), at(origin, *to)],
                    stroke(*s),
                    dash[0] as f32,
                    dash[1] as f32,
                ));
            }
            DrawCommand::HeatLayer { opacity } => {
                if let Some(handle) = &textures.heat {
                    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
                    painter.image(handle.id(), rect, FULL_UV, Color32::from_white_alpha(alpha));
                }
            }
            DrawCommand::Circle {
                center,
                radius,
                fill,
                stroke: s,
            } => {
                painter.circle(
                    at(origin, *center),
                    *radius as f32,
                    fill.map(color).unwrap_or(Color32::TRANSPARENT),
                    s.map(stroke).unwrap_or(egui::Stroke::NONE),
                );
            }
            DrawCommand::Polygon {
                points,
                fill,
                stroke: s,
            } => {
                painter.add(egui::Shape::convex_polygon(
                    points.iter().map(|p| at(origin, *p)).collect(),
                    fill.map(color).unwrap_or(Color32::TRANSPARENT),
                    s.map(stroke).unwrap_or(egui::Stroke::NONE),
                ));
            }
            DrawCommand::FillRect { rect: r, color: c } => {
                let dest = Rect::from_min_size(
                    at(origin, Point2D::new(r.x, r.y)),
                    vec2(r.width as f32, r.height as f32),
                );
                painter.rect_filled(dest, 0.0, color(*c));
            }
            DrawCommand::Text {
                pos,
                text,
                size,
                color: c,
                ..
            } => {
                let galley =
                    painter.layout_no_wrap(text.clone(), FontId::proportional(*size), color(*c));
                let anchor = at(origin, *pos);
                let top_left = pos2(anchor.x - galley.size().x / 2.0, anchor.y - size * ASCENT);
                painter.galley(top_left, galley, color(*c));
            }
            DrawCommand::Label(label) => paint_label(&painter, origin, label),
        }
    }
}

fn paint_label(painter: &egui::Painter, origin: Pos2, label: &LabelSpec) {
    let text_color = color(label.text_color);
    let galley = painter.layout_no_wrap(
        label.text.clone(),
        FontId::proportional(label.font_size),
        text_color,
    );
    let anchor = at(origin, label.anchor);
    let text_width = galley.size().x;
    let pad = label.padding as f32;

    let frame = Rect::from_min_size(
        pos2(anchor.x - text_width / 2.0 - pad, origin.y + label.box_top as f32),
        vec2(text_width + 2.0 * pad, label.box_height as f32),
    );
    let rounding = label.corner_radius as f32;
    painter.rect_filled(frame, rounding, color(label.box_fill));
    painter.rect_stroke(frame, rounding, stroke(label.box_stroke));

    let top_left = pos2(anchor.x - text_width / 2.0, anchor.y - label.font_size * ASCENT);
    painter.galley(top_left, galley, text_color);
}
