//! Side list, map toolbar, activity and selection panels.
//!
//! Panels only read state and return [`PanelAction`]s; the app applies
//! them, so the interaction controller stays the only view writer.

use citycam_geo_model::{Camera, CameraId, CameraRegistry, Category, CategoryFilter};
use citycam_motion_core::{ActivityLevel, ActivitySummary, MotionScoreMap};
use citycam_stream_engine::PlayerStatus;
use eframe::egui::{self, Color32, RichText};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelAction {
    Select(CameraId),
    ClearSelection,
    ToggleCategory(Category),
    ToggleHeat,
    ResetView,
}

pub fn camera_list(
    ui: &mut egui::Ui,
    registry: &CameraRegistry,
    filter: &CategoryFilter,
    search: &mut String,
    selected: Option<CameraId>,
    scores: &MotionScoreMap,
    actions: &mut Vec<PanelAction>,
) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("KONYA").strong().color(Color32::WHITE));
        ui.label(RichText::new("city cameras").small().color(Color32::GRAY));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(format!("{} cameras", registry.len())).small());
        });
    });
    ui.add_space(6.0);
    ui.add(egui::TextEdit::singleline(&mut *search).hint_text("Search cameras"));

    ui.horizontal_wrapped(|ui| {
        for category in Category::ALL {
            let on = filter.contains(category);
            if ui
                .selectable_label(on, RichText::new(category.label()).small())
                .clicked()
            {
                actions.push(PanelAction::ToggleCategory(category));
            }
        }
    });
    ui.separator();

    let shown = registry.search(search.as_str(), filter);
    egui::ScrollArea::vertical().show(ui, |ui| {
        if shown.is_empty() {
            ui.label(RichText::new("No cameras match").color(Color32::DARK_GRAY));
        }
        for cam in shown {
            camera_row(ui, cam, selected == Some(cam.id), scores.get(cam.id), actions);
        }
    });
}

fn camera_row(
    ui: &mut egui::Ui,
    cam: &Camera,
    is_selected: bool,
    score: Option<f64>,
    actions: &mut Vec<PanelAction>,
) {
    let name = RichText::new(&cam.name).color(if is_selected {
        Color32::WHITE
    } else {
        Color32::from_gray(0xbb)
    });
    let response = ui.selectable_label(is_selected, name);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new(cam.category.label().to_uppercase())
                .small()
                .color(Color32::from_gray(0x77)),
        );
        if let Some(score) = score {
            ui.label(RichText::new(format!("{:.0}%", score * 100.0)).small());
        }
    });
    if response.clicked() {
        actions.push(PanelAction::Select(cam.id));
    }
}

pub fn map_toolbar(ui: &mut egui::Ui, heat_enabled: bool, actions: &mut Vec<PanelAction>) {
    ui.horizontal(|ui| {
        if ui.selectable_label(heat_enabled, "◎ Heat map").clicked() {
            actions.push(PanelAction::ToggleHeat);
        }
        if ui.button("⟲ Reset view").clicked() {
            actions.push(PanelAction::ResetView);
        }
    });
}

fn level_color(level: ActivityLevel) -> Color32 {
    match level {
        ActivityLevel::Scanning => Color32::from_gray(0x66),
        ActivityLevel::Low => Color32::from_gray(0x88),
        ActivityLevel::Medium => Color32::from_gray(0xbb),
        ActivityLevel::High => Color32::WHITE,
    }
}

pub fn activity(ui: &mut egui::Ui, summary: &ActivitySummary) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("ACTIVITY").small().strong());
        ui.label(
            RichText::new(summary.level.label())
                .small()
                .color(level_color(summary.level)),
        );
    });
    let fraction = summary.mean.unwrap_or(0.0) as f32;
    ui.add(
        egui::ProgressBar::new(fraction)
            .desired_width(180.0)
            .text(format!("{}/{}", summary.scanned, summary.total)),
    );
    if summary.top.is_empty() {
        ui.label(
            RichText::new("Scanning cameras...")
                .small()
                .color(Color32::from_gray(0x66)),
        );
    }
    for cam in &summary.top {
        ui.horizontal(|ui| {
            ui.label(RichText::new(&cam.name).small());
            ui.label(RichText::new(format!("{:.0}%", cam.score * 100.0)).small());
        });
    }
}

/// Width of the live preview in the selection card.
const PREVIEW_WIDTH: f32 = 260.0;

/// Live preview of the selected camera, as the card shows it.
pub struct LiveView<'a> {
    pub texture: Option<&'a egui::TextureHandle>,
    pub status: Option<&'a PlayerStatus>,
    pub stream_url: Option<&'a str>,
}

pub fn selection(
    ui: &mut egui::Ui,
    cam: &Camera,
    live: LiveView<'_>,
    score: Option<f64>,
    actions: &mut Vec<PanelAction>,
) {
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.label(RichText::new(&cam.name).strong().color(Color32::WHITE));
            ui.label(RichText::new(cam.category.label()).small());
        });
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
            if ui.small_button("✕").clicked() {
                actions.push(PanelAction::ClearSelection);
            }
        });
    });
    ui.label(
        RichText::new(format!("{:.5}, {:.5}", cam.lat, cam.lng))
            .small()
            .color(Color32::from_gray(0x88)),
    );
    match score {
        Some(score) => ui.label(format!("Motion {:.0}%", score * 100.0)),
        None => ui.label(RichText::new("Not scored yet").small()),
    };
    live_preview(ui, &live);
}

fn live_preview(ui: &mut egui::Ui, live: &LiveView<'_>) {
    let size = egui::vec2(PREVIEW_WIDTH, PREVIEW_WIDTH * 9.0 / 16.0);
    if let Some(texture) = live.texture {
        ui.add(egui::Image::new((texture.id(), size)));
    }
    match (live.status, live.stream_url) {
        (Some(PlayerStatus::Live), _) => {
            ui.label(RichText::new("● LIVE").small().color(Color32::from_rgb(0xff, 0x44, 0x44)));
        }
        (Some(status), _) if !status.label().is_empty() => {
            ui.label(RichText::new(status.label()).small().color(Color32::from_gray(0x88)));
        }
        // No preview support; fall back to the manifest link.
        (None, Some(url)) => {
            ui.hyperlink_to(RichText::new("LIVE stream").small(), url);
        }
        (None, None) => {
            ui.label(RichText::new("No live stream").small());
        }
        _ => {}
    }
}

pub fn legend(ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        for category in Category::ALL {
            let glyph = match category.shape() {
                citycam_geo_model::MarkerShape::Circle => "●",
                citycam_geo_model::MarkerShape::Diamond => "◆",
                citycam_geo_model::MarkerShape::Square => "■",
                citycam_geo_model::MarkerShape::Triangle => "▲",
            };
            ui.label(
                RichText::new(format!("{glyph} {}", category.label()))
                    .small()
                    .color(Color32::from_gray(0x77)),
            );
        }
    });
}
