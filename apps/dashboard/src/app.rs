use std::sync::Arc;

use citycam_common::config::AppConfig;
use citycam_geo_model::{
    Camera, CameraId, CameraRegistry, CategoryFilter, Point2D, ViewState, ViewportSize,
};
use citycam_interaction::{CursorHint, InteractionController, InteractionSnapshot, PointerEvent};
use citycam_motion_core::{ActivitySummary, MotionScoreMap};
use citycam_render_engine::{FrameInput, HttpTileFetcher, RenderLoop, TileCache};
use citycam_stream_engine::{
    score_channel, GstPreviewSource, GstStreamSource, LivePlayer, MotionScheduler,
    SchedulerConfig, SchedulerHandle, ScoreReader, StreamEndpoint,
};
use eframe::egui::{self, Color32, Pos2, TextureOptions};

use crate::painter::{self, MapTextures};
use crate::panels::{self, LiveView, PanelAction};

pub struct DashboardApp {
    runtime: tokio::runtime::Runtime,
    registry: Arc<CameraRegistry>,
    stream_base_url: String,
    controller: InteractionController,
    render_loop: RenderLoop,
    tiles: TileCache,
    textures: MapTextures,
    scores: ScoreReader,
    scheduler: Option<SchedulerHandle>,
    player: Option<LivePlayer>,
    live_texture: Option<(CameraId, egui::TextureHandle)>,
    heat_enabled: bool,
    search: String,
    last_pointer: Option<Pos2>,
    running: bool,
}

impl DashboardApp {
    pub fn new(
        config: AppConfig,
        registry: CameraRegistry,
        runtime: tokio::runtime::Runtime,
    ) -> anyhow::Result<Self> {
        let registry = Arc::new(registry);
        let fetcher = HttpTileFetcher::new(&config.tiles, runtime.handle().clone())?;
        let tiles = TileCache::new(Box::new(fetcher), &config.tiles);

        let (publisher, scores) = score_channel();
        let scheduler = match GstStreamSource::new() {
            Ok(source) => {
                let _guard = runtime.enter();
                let scheduler = MotionScheduler::new(
                    Arc::clone(&registry),
                    Box::new(source),
                    SchedulerConfig::from(&config.motion),
                    publisher,
                );
                Some(scheduler.spawn())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stream decoding unavailable; motion scores disabled");
                None
            }
        };

        let player = match GstPreviewSource::new() {
            Ok(source) => Some(LivePlayer::new(
                Box::new(source),
                config.motion.stream_base_url.clone(),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "Live preview unavailable");
                None
            }
        };

        let home = ViewState::new(config.map.center_lat, config.map.center_lng, config.map.zoom);
        tracing::info!(cameras = registry.len(), "Dashboard started");

        Ok(Self {
            runtime,
            registry,
            stream_base_url: config.motion.stream_base_url,
            controller: InteractionController::new(home),
            render_loop: RenderLoop::new(),
            tiles,
            textures: MapTextures::default(),
            scores,
            scheduler,
            player,
            live_texture: None,
            heat_enabled: true,
            search: String::new(),
            last_pointer: None,
            running: true,
        })
    }

    /// View, selection and hover as the map currently shows them.
    pub fn snapshot(&self) -> InteractionSnapshot {
        self.controller.snapshot()
    }

    pub fn scores(&self) -> Arc<MotionScoreMap> {
        self.scores.snapshot()
    }

    fn visible_cameras(&self) -> Vec<Camera> {
        self.registry.visible(&self.controller.filter())
    }

    /// Point the live preview at the current selection and upload any new
    /// frame.
    fn sync_live(&mut self, ctx: &egui::Context) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.follow(self.controller.selected(), &self.registry);
        if self
            .live_texture
            .as_ref()
            .is_some_and(|(id, _)| Some(*id) != player.camera())
        {
            self.live_texture = None;
        }
        let (Some(camera), Some(frame)) = (player.camera(), player.poll()) else {
            return;
        };
        let image =
            egui::ColorImage::from_rgba_unmultiplied([frame.width, frame.height], &frame.rgba);
        match &mut self.live_texture {
            Some((_, handle)) => handle.set(image, TextureOptions::LINEAR),
            None => {
                let handle = ctx.load_texture("live-preview", image, TextureOptions::LINEAR);
                self.live_texture = Some((camera, handle));
            }
        }
    }

    fn apply(&mut self, action: PanelAction) {
        match action {
            PanelAction::Select(id) => {
                if let Some(cam) = self.registry.get(id) {
                    self.controller.select(cam);
                }
            }
            PanelAction::ClearSelection => self.controller.clear_selection(),
            PanelAction::ToggleCategory(category) => {
                let mut filter = self.controller.filter();
                filter.toggle(category);
                self.controller.set_filter(filter);
            }
            PanelAction::ToggleHeat => self.heat_enabled = !self.heat_enabled,
            PanelAction::ResetView => self.controller.reset(),
        }
    }

    fn route_input(&mut self, ctx: &egui::Context, response: &egui::Response) {
        let rect = response.rect;
        let local = |p: Pos2| Point2D::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64);
        let (pressed, released, scroll_y) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.raw_scroll_delta.y,
            )
        });
        let registry = Arc::clone(&self.registry);
        let hover = response.hover_pos();

        match hover {
            Some(p) => {
                if self.last_pointer != Some(p) {
                    self.controller
                        .handle(PointerEvent::Move { pos: local(p) }, &registry);
                }
                if pressed {
                    self.controller
                        .handle(PointerEvent::Down { pos: local(p) }, &registry);
                }
                if scroll_y != 0.0 {
                    self.controller.handle(
                        PointerEvent::Wheel {
                            delta_y: wheel_delta(scroll_y),
                        },
                        &registry,
                    );
                }
                ctx.set_cursor_icon(match self.controller.cursor() {
                    CursorHint::Pointer => egui::CursorIcon::PointingHand,
                    CursorHint::Grabbing => egui::CursorIcon::Grabbing,
                    CursorHint::Grab => egui::CursorIcon::Grab,
                });
            }
            None if self.last_pointer.is_some() => {
                self.controller.handle(PointerEvent::Leave, &registry);
            }
            None => {}
        }
        if released {
            self.controller.handle(PointerEvent::Up, &registry);
        }
        self.last_pointer = hover;
    }

    fn show_map(&mut self, ui: &mut egui::Ui) {
        let (response, map_painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        let viewport = ViewportSize::new(rect.width() as f64, rect.height() as f64);
        self.controller.set_viewport(viewport);
        self.route_input(ui.ctx(), &response);

        let cameras = self.visible_cameras();
        let input = FrameInput {
            viewport,
            interaction: self.controller.snapshot(),
            cameras: &cameras,
            heat_enabled: self.heat_enabled,
        };
        let frame = self.render_loop.tick(input, &mut self.tiles);
        if let Some(heat) = frame.heat {
            self.textures.sync_heat(ui.ctx(), heat);
        }
        painter::paint(&map_painter, rect, frame.commands, &mut self.textures, &self.tiles);

        if self.tiles.take_dirty() {
            tracing::debug!(
                cached = self.tiles.len(),
                ready = self.tiles.ready_count(),
                failed = self.tiles.failed_count(),
                "Tiles arrived"
            );
        }
    }

    /// Stop repainting, close the live preview, stop the scheduler and
    /// wait for its stream to close.
    pub fn shutdown(&mut self) {
        self.running = false;
        if let Some(player) = self.player.as_mut() {
            player.close();
        }
        self.live_texture = None;
        if let Some(handle) = self.scheduler.take() {
            self.runtime.block_on(handle.shutdown());
            tracing::info!("Motion scheduler stopped");
        }
    }
}

/// Cameras the activity summary covers: the list as filtered and searched.
fn activity_cameras(
    registry: &CameraRegistry,
    search: &str,
    filter: &CategoryFilter,
) -> Vec<Camera> {
    registry.search(search, filter).into_iter().cloned().collect()
}

/// egui reports positive `y` for scrolling up; the controller expects
/// positive for scrolling down.
fn wheel_delta(scroll_y: f32) -> f64 {
    -f64::from(scroll_y)
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.running {
            return;
        }
        let scores = self.scores.snapshot();
        let snapshot = self.controller.snapshot();
        let filter = self.controller.filter();
        let mut actions = Vec::new();

        egui::SidePanel::left("camera-list")
            .resizable(false)
            .exact_width(260.0)
            .show(ctx, |ui| {
                panels::camera_list(
                    ui,
                    &self.registry,
                    &filter,
                    &mut self.search,
                    snapshot.selected,
                    &scores,
                    &mut actions,
                );
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::from_rgb(8, 8, 8)))
            .show(ctx, |ui| self.show_map(ui));

        egui::Area::new(egui::Id::new("map-toolbar"))
            .anchor(egui::Align2::CENTER_TOP, [130.0, 12.0])
            .show(ctx, |ui| panels::map_toolbar(ui, self.heat_enabled, &mut actions));

        let shown = activity_cameras(&self.registry, &self.search, &filter);
        let summary = ActivitySummary::compute(&shown, &scores);
        egui::Window::new("Activity")
            .title_bar(false)
            .resizable(false)
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -36.0])
            .show(ctx, |ui| panels::activity(ui, &summary));

        egui::Area::new(egui::Id::new("legend"))
            .anchor(egui::Align2::LEFT_BOTTOM, [272.0, -8.0])
            .show(ctx, panels::legend);

        if let Some(cam) = snapshot.selected.and_then(|id| self.registry.get(id)) {
            let url = self
                .registry
                .stream_id(cam.id)
                .map(|stream| StreamEndpoint::resolve(&self.stream_base_url, cam.id, stream))
                .map(|endpoint| endpoint.manifest_url);
            let live = LiveView {
                texture: self
                    .live_texture
                    .as_ref()
                    .filter(|(id, _)| *id == cam.id)
                    .map(|(_, handle)| handle),
                status: self.player.as_ref().map(LivePlayer::status),
                stream_url: url.as_deref(),
            };
            egui::Window::new("Selected camera")
                .title_bar(false)
                .resizable(false)
                .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
                .show(ctx, |ui| {
                    panels::selection(ui, cam, live, scores.get(cam.id), &mut actions)
                });
        }

        for action in actions {
            self.apply(action);
        }
        self.sync_live(ctx);

        // The map animates continuously; the next frame is the next tick.
        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.shutdown();
    }
}

impl Drop for DashboardApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}
