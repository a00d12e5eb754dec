//! End-to-end: a single park camera centred in an 800×600 viewport.

use std::collections::BTreeMap;

use citycam_geo_model::{project, Camera, CameraRegistry, Category, Point2D, ViewState, ViewportSize};
use citycam_interaction::{CursorHint, InteractionController, PointerEvent};

fn single_camera() -> CameraRegistry {
    let mut streams = BTreeMap::new();
    streams.insert(1, "stream-1".to_string());
    CameraRegistry::new(
        vec![Camera::new(1, "Park", 37.87, 32.49, Category::Park)],
        streams,
    )
    .unwrap()
}

#[test]
fn click_on_centred_camera_selects_and_zooms() {
    let registry = single_camera();
    let viewport = ViewportSize::new(800.0, 600.0);
    let view = ViewState::new(37.87, 32.49, 14.0);

    let pos = project(32.49, 37.87, &view, viewport);
    assert_eq!(pos, Point2D::new(400.0, 300.0));

    let mut controller = InteractionController::new(view);
    controller.set_viewport(viewport);
    controller.handle(PointerEvent::Down { pos }, &registry);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.selected, Some(1));
    assert_eq!(snapshot.view.zoom(), 15.0);
    assert!(!snapshot.dragging);
    assert_eq!(snapshot.view.lat(), 37.87);
    assert_eq!(snapshot.view.lng(), 32.49);
}

#[test]
fn click_far_from_every_camera_pans_instead() {
    let registry = single_camera();
    let mut controller = InteractionController::new(ViewState::new(37.87, 32.49, 14.0));
    controller.set_viewport(ViewportSize::new(800.0, 600.0));

    controller.handle(PointerEvent::Down { pos: Point2D::new(400.0, 330.0) }, &registry);
    assert_eq!(controller.selected(), None);
    assert_eq!(controller.cursor(), CursorHint::Grabbing);

    controller.handle(PointerEvent::Move { pos: Point2D::new(400.0, 430.0) }, &registry);
    // Dragging down pulls the map south, so the centre moves north.
    assert!(controller.view().lat() > 37.87);
    controller.handle(PointerEvent::Up, &registry);
    assert_eq!(controller.cursor(), CursorHint::Grab);
}
