//! Per-tick map compositing.
//!
//! [`RenderLoop::tick`] is called once per display refresh. It reads the
//! latest interaction snapshot and tile cache, rebuilds the whole display
//! list starting from a clear, and advances the pulse clock. It never
//! waits: missing tiles are skipped and show up on a later tick.

use citycam_common::clock::PulseClock;
use citycam_geo_model::{project, Camera, MarkerShape, Point2D, TileGrid, ViewportSize};
use citycam_interaction::InteractionSnapshot;

use crate::heat::{HeatLayer, HEAT_BASE_RADIUS, HEAT_OPACITY, HEAT_PULSE_AMPLITUDE};
use crate::scene::{
    marker_outline, DrawCommand, FontWeight, LabelSpec, Rect, Rgba, Stroke, BACKGROUND,
};
use crate::tiles::TileCache;

/// Cameras closer than this many degrees are joined by a connector.
pub const CONNECTOR_MAX_DEGREES: f64 = 0.006;

/// Zoom at which every camera is labelled.
pub const LABEL_ZOOM: f64 = 15.5;

const CROSSHAIR_SIZE: f64 = 8.0;

/// Everything a tick reads.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub viewport: ViewportSize,
    pub interaction: InteractionSnapshot,
    /// Filter-visible cameras in registry order.
    pub cameras: &'a [Camera],
    pub heat_enabled: bool,
}

/// Output of one tick.
#[derive(Debug)]
pub struct Frame<'a> {
    pub commands: &'a [DrawCommand],
    /// The heat raster referenced by [`DrawCommand::HeatLayer`].
    pub heat: Option<&'a HeatLayer>,
    /// The surface size changed since the previous tick.
    pub resized: bool,
}

#[derive(Debug, Default)]
pub struct RenderLoop {
    surface: Option<(usize, usize)>,
    pulse: PulseClock,
    heat: HeatLayer,
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulse(&self) -> f64 {
        self.pulse.phase()
    }

    /// Ticks that produced a frame.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick(&mut self, input: FrameInput<'_>, tiles: &mut TileCache) -> Frame<'_> {
        tiles.pump();
        self.commands.clear();

        let vp = input.viewport;
        if vp.is_empty() {
            return Frame {
                commands: &self.commands,
                heat: None,
                resized: false,
            };
        }

        let size = (vp.width.floor() as usize, vp.height.floor() as usize);
        let resized = self.surface != Some(size);
        if resized {
            self.surface = Some(size);
            self.heat.resize(size.0, size.1);
            tracing::debug!(width = size.0, height = size.1, "Map surface resized");
        }

        self.commands.push(DrawCommand::Clear { color: BACKGROUND });
        self.draw_tiles(&input, tiles);

        let positions: Vec<Point2D> = input
            .cameras
            .iter()
            .map(|cam| project(cam.lng, cam.lat, &input.interaction.view, vp))
            .collect();

        self.draw_connectors(input.cameras, &positions);
        let heat = if input.heat_enabled {
            self.draw_heat(&positions);
            true
        } else {
            false
        };
        for (cam, &pos) in input.cameras.iter().zip(&positions) {
            self.draw_marker(cam, pos, &input.interaction);
        }
        self.draw_chrome(vp);

        self.pulse.advance();
        self.frames += 1;

        Frame {
            commands: &self.commands,
            heat: heat.then_some(&self.heat),
            resized,
        }
    }

    fn draw_tiles(&mut self, input: &FrameInput<'_>, tiles: &mut TileCache) {
        let grid = TileGrid::visible(&input.interaction.view, input.viewport);
        for cell in grid.cells() {
            if tiles.get(cell.key).is_ready() {
                self.commands.push(DrawCommand::Tile {
                    key: cell.key,
                    rect: Rect::new(cell.x, cell.y, cell.size, cell.size),
                });
            }
        }
    }

    fn draw_connectors(&mut self, cameras: &[Camera], positions: &[Point2D]) {
        let stroke = Stroke::new(0.5, Rgba::white(0.06));
        for (i, a) in cameras.iter().enumerate() {
            for (j, b) in cameras.iter().enumerate().skip(i + 1) {
                if a.degree_distance(b) < CONNECTOR_MAX_DEGREES {
                    self.commands.push(DrawCommand::DashedLine {
                        from: positions[i],
                        to: positions[j],
                        dash: [3.0, 5.0],
                        stroke,
                    });
                }
            }
        }
    }

    fn draw_heat(&mut self, positions: &[Point2D]) {
        let radius = HEAT_BASE_RADIUS + self.pulse.wave(1.5, 0.0) * HEAT_PULSE_AMPLITUDE;
        self.heat.clear();
        for &pos in positions {
            self.heat.splat(pos, radius);
        }
        self.heat.finish();
        self.commands.push(DrawCommand::HeatLayer {
            opacity: HEAT_OPACITY,
        });
    }

    fn draw_marker(&mut self, cam: &Camera, p: Point2D, ui: &InteractionSnapshot) {
        let selected = ui.selected == Some(cam.id);
        let hovered = ui.hovered == Some(cam.id);
        let shape = cam.category.shape();
        let r = if selected {
            8.0
        } else if hovered {
            7.0
        } else {
            5.0
        };

        let ring = r + 14.0 + self.pulse.wave(1.0, 0.0) * 5.0;
        self.commands.push(DrawCommand::Circle {
            center: p,
            radius: ring,
            fill: None,
            stroke: Some(Stroke::new(1.0, Rgba::white(if selected { 0.2 } else { 0.08 }))),
        });
        if selected {
            let outer = r + 24.0 + self.pulse.wave(1.0, 1.2) * 7.0;
            self.commands.push(DrawCommand::Circle {
                center: p,
                radius: outer,
                fill: None,
                stroke: Some(Stroke::new(1.0, Rgba::white(0.06))),
            });
        }

        let halo = Rgba::white(if selected { 0.15 } else { 0.06 });
        self.commands
            .push(marker_outline(shape, p, r + 2.0, Some(halo), None));

        let fill = if selected {
            Rgba::rgb(0xff, 0xff, 0xff)
        } else if hovered {
            Rgba::rgb(0xd4, 0xd4, 0xd4)
        } else {
            Rgba::rgb(0x99, 0x99, 0x99)
        };
        let stroke = if selected {
            Stroke::new(1.5, Rgba::white(1.0))
        } else {
            Stroke::new(0.75, Rgba::white(0.3))
        };
        self.commands
            .push(marker_outline(shape, p, r, Some(fill), Some(stroke)));

        if shape == MarkerShape::Circle {
            self.commands.push(DrawCommand::Circle {
                center: p,
                radius: 1.5,
                fill: Some(BACKGROUND),
                stroke: None,
            });
        }

        if selected || hovered || ui.view.zoom() >= LABEL_ZOOM {
            self.commands.push(DrawCommand::Label(LabelSpec {
                text: cam.name.clone(),
                anchor: Point2D::new(p.x, p.y - r - 10.0),
                box_top: p.y - r - 22.0,
                box_height: 17.0,
                padding: 8.0,
                corner_radius: 3.0,
                font_size: if selected { 10.0 } else { 9.0 },
                weight: if selected {
                    FontWeight::Semibold
                } else {
                    FontWeight::Regular
                },
                text_color: if selected {
                    Rgba::rgb(0xff, 0xff, 0xff)
                } else {
                    Rgba::rgb(0xaa, 0xaa, 0xaa)
                },
                box_fill: BACKGROUND.with_alpha(0.9),
                box_stroke: Stroke::new(0.5, Rgba::white(if selected { 0.25 } else { 0.08 })),
            }));
        }
    }

    fn draw_chrome(&mut self, vp: ViewportSize) {
        let (w, h) = (vp.width, vp.height);
        let p = Point2D::new;

        // Compass
        let (cx, cy) = (w - 36.0, 36.0);
        self.commands.push(DrawCommand::Circle {
            center: p(cx, cy),
            radius: 16.0,
            fill: None,
            stroke: Some(Stroke::new(0.75, Rgba::white(0.12))),
        });
        self.commands.push(DrawCommand::Polygon {
            points: vec![p(cx, cy - 12.0), p(cx - 3.0, cy - 2.0), p(cx + 3.0, cy - 2.0)],
            fill: Some(Rgba::white(1.0)),
            stroke: None,
        });
        self.commands.push(DrawCommand::Polygon {
            points: vec![p(cx, cy + 12.0), p(cx - 3.0, cy + 2.0), p(cx + 3.0, cy + 2.0)],
            fill: Some(Rgba::white(0.2)),
            stroke: None,
        });
        self.commands.push(DrawCommand::Text {
            pos: p(cx, cy - 18.0),
            text: "N".into(),
            size: 7.0,
            weight: FontWeight::Bold,
            color: Rgba::white(0.5),
        });

        // Scale bar
        let bar = Rgba::white(0.35);
        for rect in [
            Rect::new(w - 110.0, h - 24.0, 70.0, 1.0),
            Rect::new(w - 110.0, h - 27.0, 0.5, 5.0),
            Rect::new(w - 40.0, h - 27.0, 0.5, 5.0),
        ] {
            self.commands.push(DrawCommand::FillRect { rect, color: bar });
        }
        self.commands.push(DrawCommand::Text {
            pos: p(w - 75.0, h - 13.0),
            text: "~500m".into(),
            size: 8.0,
            weight: FontWeight::Regular,
            color: Rgba::white(0.4),
        });

        // Crosshair
        let c = vp.center();
        let stroke = Stroke::new(0.5, Rgba::white(0.1));
        self.commands.push(DrawCommand::Line {
            from: p(c.x - CROSSHAIR_SIZE, c.y),
            to: p(c.x + CROSSHAIR_SIZE, c.y),
            stroke,
        });
        self.commands.push(DrawCommand::Line {
            from: p(c.x, c.y - CROSSHAIR_SIZE),
            to: p(c.x, c.y + CROSSHAIR_SIZE),
            stroke,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::Sender;
    use std::sync::{Arc, Mutex};

    use citycam_common::config::TileConfig;
    use citycam_geo_model::{Category, TileKey, ViewState};

    use super::*;
    use crate::tiles::{TileFetcher, TileImage, TileLoad};

    #[derive(Clone, Default)]
    struct ManualFetcher {
        pending: Arc<Mutex<Vec<(TileKey, Sender<TileLoad>)>>>,
    }

    impl TileFetcher for ManualFetcher {
        fn request(&self, key: TileKey, _url: String, done: Sender<TileLoad>) {
            self.pending.lock().unwrap().push((key, done));
        }
    }

    impl ManualFetcher {
        fn complete_all(&self) -> usize {
            let mut pending = self.pending.lock().unwrap();
            let n = pending.len();
            for (key, done) in pending.drain(..) {
                let image = TileImage {
                    width: 1,
                    height: 1,
                    rgba: Arc::from(vec![0u8; 4]),
                };
                done.send(TileLoad {
                    key,
                    result: Ok(image),
                })
                .unwrap();
            }
            n
        }
    }

    fn cameras() -> Vec<Camera> {
        vec![
            Camera::new(1, "Alaaddin", 37.8730, 32.4930, Category::Historic),
            Camera::new(2, "Mevlana", 37.8710, 32.5050, Category::Historic),
            Camera::new(3, "Kule", 37.8740, 32.4960, Category::Square),
        ]
    }

    fn snapshot(zoom: f64) -> InteractionSnapshot {
        InteractionSnapshot {
            view: ViewState::new(37.8730, 32.4930, zoom),
            selected: None,
            hovered: None,
            dragging: false,
        }
    }

    fn setup() -> (RenderLoop, TileCache, ManualFetcher) {
        let fetcher = ManualFetcher::default();
        let cache = TileCache::new(Box::new(fetcher.clone()), &TileConfig::default());
        (RenderLoop::new(), cache, fetcher)
    }

    fn input(cams: &[Camera], ui: InteractionSnapshot, heat: bool) -> FrameInput<'_> {
        FrameInput {
            viewport: ViewportSize::new(800.0, 600.0),
            interaction: ui,
            cameras: cams,
            heat_enabled: heat,
        }
    }

    fn count(commands: &[DrawCommand], pred: impl Fn(&DrawCommand) -> bool) -> usize {
        commands.iter().filter(|c| pred(c)).count()
    }

    #[test]
    fn test_every_frame_starts_with_clear() {
        let (mut rl, mut tiles, _) = setup();
        let cams = cameras();
        let frame = rl.tick(input(&cams, snapshot(14.0), true), &mut tiles);
        assert_eq!(frame.commands[0], DrawCommand::Clear { color: BACKGROUND });
        assert!(frame.resized);
    }

    #[test]
    fn test_resize_only_on_size_change() {
        let (mut rl, mut tiles, _) = setup();
        let cams = cameras();
        assert!(rl.tick(input(&cams, snapshot(14.0), true), &mut tiles).resized);
        assert!(!rl.tick(input(&cams, snapshot(14.0), true), &mut tiles).resized);
        let mut bigger = input(&cams, snapshot(14.0), true);
        bigger.viewport = ViewportSize::new(1024.0, 600.0);
        let frame = rl.tick(bigger, &mut tiles);
        assert!(frame.resized);
        assert_eq!(frame.heat.map(|h| h.width()), Some(1024));
    }

    #[test]
    fn test_tiles_appear_on_tick_after_arrival() {
        let (mut rl, mut tiles, fetcher) = setup();
        let cams = cameras();
        let is_tile = |c: &DrawCommand| matches!(c, DrawCommand::Tile { .. });

        let frame = rl.tick(input(&cams, snapshot(14.0), false), &mut tiles);
        assert_eq!(count(frame.commands, is_tile), 0);
        let requested = fetcher.complete_all();
        assert!(requested > 0);

        let frame = rl.tick(input(&cams, snapshot(14.0), false), &mut tiles);
        assert_eq!(count(frame.commands, is_tile), requested);
        assert_eq!(fetcher.complete_all(), 0);
    }

    #[test]
    fn test_connectors_join_close_cameras_only() {
        let (mut rl, mut tiles, _) = setup();
        let cams = cameras();
        let frame = rl.tick(input(&cams, snapshot(14.0), false), &mut tiles);
        // 1 and 3 are ~0.003° apart, 2 is ~0.012° from both.
        let dashed = count(frame.commands, |c| matches!(c, DrawCommand::DashedLine { .. }));
        assert_eq!(dashed, 1);
    }

    #[test]
    fn test_heat_layer_follows_toggle() {
        let (mut rl, mut tiles, _) = setup();
        let cams = cameras();
        let frame = rl.tick(input(&cams, snapshot(14.0), false), &mut tiles);
        assert!(frame.heat.is_none());
        assert_eq!(count(frame.commands, |c| matches!(c, DrawCommand::HeatLayer { .. })), 0);

        let frame = rl.tick(input(&cams, snapshot(14.0), true), &mut tiles);
        let heat = frame.heat.unwrap();
        assert!(heat.coverage_at(400, 300).unwrap() > 0.5);
        assert!(frame
            .commands
            .contains(&DrawCommand::HeatLayer { opacity: HEAT_OPACITY }));
    }

    #[test]
    fn test_labels_for_selection_and_hover() {
        let (mut rl, mut tiles, _) = setup();
        let cams = cameras();
        let is_label = |c: &DrawCommand| matches!(c, DrawCommand::Label(_));

        let frame = rl.tick(input(&cams, snapshot(14.0), false), &mut tiles);
        assert_eq!(count(frame.commands, is_label), 0);

        let mut ui = snapshot(14.0);
        ui.selected = Some(1);
        ui.hovered = Some(2);
        let frame = rl.tick(input(&cams, ui, false), &mut tiles);
        let labels: Vec<&LabelSpec> = frame
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Label(l) => Some(l),
                _ => None,
            })
            .collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].text, "Alaaddin");
        assert_eq!(labels[0].weight, FontWeight::Semibold);
        // Selected marker radius 8: baseline 18 above the centre.
        assert_eq!(labels[0].anchor, Point2D::new(400.0, 282.0));
        assert_eq!(labels[0].box_top, 270.0);

        let frame = rl.tick(input(&cams, snapshot(15.5), false), &mut tiles);
        assert_eq!(count(frame.commands, is_label), 3);
    }

    #[test]
    fn test_selected_marker_has_second_ring() {
        let (mut rl, mut tiles, _) = setup();
        let cams = cameras();
        let circles_at_center = |commands: &[DrawCommand]| {
            count(commands, |c| {
                matches!(c, DrawCommand::Circle { center, fill: None, .. }
                    if *center == Point2D::new(400.0, 300.0))
            })
        };
        let frame = rl.tick(input(&cams, snapshot(14.0), false), &mut tiles);
        assert_eq!(circles_at_center(frame.commands), 1);

        let mut ui = snapshot(14.0);
        ui.selected = Some(1);
        let frame = rl.tick(input(&cams, ui, false), &mut tiles);
        assert_eq!(circles_at_center(frame.commands), 2);
    }

    #[test]
    fn test_pulse_advances_per_frame() {
        let (mut rl, mut tiles, _) = setup();
        let cams = cameras();
        rl.tick(input(&cams, snapshot(14.0), false), &mut tiles);
        rl.tick(input(&cams, snapshot(14.0), false), &mut tiles);
        assert!((rl.pulse() - 0.04).abs() < 1e-12);
        assert_eq!(rl.frames(), 2);
    }

    #[test]
    fn test_empty_surface_draws_nothing() {
        let (mut rl, mut tiles, _) = setup();
        let cams = cameras();
        let mut zero = input(&cams, snapshot(14.0), true);
        zero.viewport = ViewportSize::new(0.0, 0.0);
        let frame = rl.tick(zero, &mut tiles);
        assert!(frame.commands.is_empty());
        assert!(frame.heat.is_none());
        assert_eq!(rl.frames(), 0);
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_chrome_is_drawn() {
        let (mut rl, mut tiles, _) = setup();
        let frame = rl.tick(input(&[], snapshot(14.0), false), &mut tiles);
        let texts: Vec<&str> = frame
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["N", "~500m"]);
        assert!(frame.commands.contains(&DrawCommand::Line {
            from: Point2D::new(392.0, 300.0),
            to: Point2D::new(408.0, 300.0),
            stroke: Stroke::new(0.5, Rgba::white(0.1)),
        }));
    }
}
