use citycam_common::config::AppConfig;
use citycam_common::CitycamError;
use citycam_geo_model::CameraRegistry;
use eframe::egui;

mod app;
mod painter;
mod panels;

use app::DashboardApp;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load();
    citycam_common::logging::init_logging(&config.logging);

    let registry = match &config.registry_path {
        Some(path) => CameraRegistry::load(path).map_err(|e| {
            CitycamError::registry(format!("failed to load {}: {e}", path.display()))
        })?,
        None => CameraRegistry::builtin(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let app = DashboardApp::new(config, registry, runtime)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("CityCam")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CityCam",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow::anyhow!("dashboard launch failed: {e}"))
}
