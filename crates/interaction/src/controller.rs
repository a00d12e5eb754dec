//! The interaction controller.

use citycam_geo_model::{
    pan_delta, project, Camera, CameraId, CameraRegistry, CategoryFilter, Point2D, ViewState,
    ViewportSize,
};
use serde::Serialize;

use crate::event::{CursorHint, PointerEvent};

/// Pick radius around a marker centre, in pixels.
pub const PICK_RADIUS: f64 = 18.0;

/// Zoom change per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 0.3;

/// Selecting a camera zooms in to at least this level.
pub const SELECT_MIN_ZOOM: f64 = 15.0;

/// What the render loop reads each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InteractionSnapshot {
    pub view: ViewState,
    pub selected: Option<CameraId>,
    pub hovered: Option<CameraId>,
    pub dragging: bool,
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    origin: Point2D,
    lat: f64,
    lng: f64,
}

/// First filter-visible camera whose marker lies strictly within
/// [`PICK_RADIUS`] of `pos`, in registry order.
pub fn hit_test<'a>(
    cameras: impl IntoIterator<Item = &'a Camera>,
    filter: &CategoryFilter,
    view: &ViewState,
    viewport: ViewportSize,
    pos: Point2D,
) -> Option<CameraId> {
    cameras
        .into_iter()
        .filter(|cam| filter.passes(cam))
        .find(|cam| project(cam.lng, cam.lat, view, viewport).distance_to(&pos) < PICK_RADIUS)
        .map(|cam| cam.id)
}

/// Owns the view state, hover, selection and drag session.
#[derive(Debug, Clone)]
pub struct InteractionController {
    view: ViewState,
    home: ViewState,
    viewport: ViewportSize,
    filter: CategoryFilter,
    hovered: Option<CameraId>,
    selected: Option<CameraId>,
    drag: Option<DragSession>,
}

impl InteractionController {
    /// Start at `home`, which is also the reset target.
    pub fn new(home: ViewState) -> Self {
        Self {
            view: home,
            home,
            viewport: ViewportSize::new(0.0, 0.0),
            filter: CategoryFilter::all(),
            hovered: None,
            selected: None,
            drag: None,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn selected(&self) -> Option<CameraId> {
        self.selected
    }

    pub fn hovered(&self) -> Option<CameraId> {
        self.hovered
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn snapshot(&self) -> InteractionSnapshot {
        InteractionSnapshot {
            view: self.view,
            selected: self.selected,
            hovered: self.hovered,
            dragging: self.drag.is_some(),
        }
    }

    pub fn cursor(&self) -> CursorHint {
        if self.hovered.is_some() {
            CursorHint::Pointer
        } else if self.drag.is_some() {
            CursorHint::Grabbing
        } else {
            CursorHint::Grab
        }
    }

    /// The surface size hit-tests project into.
    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    /// Change which categories are visible. A hidden hovered or selected
    /// camera stays recorded but is no longer hit.
    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    /// Apply one input event.
    pub fn handle(&mut self, event: PointerEvent, registry: &CameraRegistry) {
        match event {
            PointerEvent::Down { pos } => self.pointer_down(pos, registry),
            PointerEvent::Move { pos } => self.pointer_move(pos, registry),
            PointerEvent::Up | PointerEvent::Leave => {
                if self.drag.take().is_some() {
                    tracing::trace!(lat = self.view.lat(), lng = self.view.lng(), "Drag ended");
                }
                if event == PointerEvent::Leave {
                    self.hovered = None;
                }
            }
            PointerEvent::Wheel { delta_y } => {
                let step = if delta_y > 0.0 {
                    -WHEEL_ZOOM_STEP
                } else {
                    WHEEL_ZOOM_STEP
                };
                self.view.zoom_by(step);
            }
        }
    }

    fn pointer_down(&mut self, pos: Point2D, registry: &CameraRegistry) {
        let hit = hit_test(registry.cameras(), &self.filter, &self.view, self.viewport, pos);
        match hit.and_then(|id| registry.get(id)) {
            Some(camera) => self.select(camera),
            None => {
                self.drag = Some(DragSession {
                    origin: pos,
                    lat: self.view.lat(),
                    lng: self.view.lng(),
                });
            }
        }
    }

    fn pointer_move(&mut self, pos: Point2D, registry: &CameraRegistry) {
        self.hovered = hit_test(registry.cameras(), &self.filter, &self.view, self.viewport, pos);
        if let Some(drag) = self.drag {
            let (dlng, dlat) = pan_delta(pos.x - drag.origin.x, pos.y - drag.origin.y, self.view.zoom());
            self.view.set_center(drag.lat + dlat, drag.lng + dlng);
        }
    }

    /// Select a camera and bring it to the centre, zooming in if needed.
    pub fn select(&mut self, camera: &Camera) {
        tracing::debug!(camera = camera.id, name = %camera.name, "Camera selected");
        self.selected = Some(camera.id);
        self.view.set_center(camera.lat, camera.lng);
        self.view.set_zoom(self.view.zoom().max(SELECT_MIN_ZOOM));
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Restore the home view and drop selection and drag state.
    pub fn reset(&mut self) {
        self.view = self.home;
        self.selected = None;
        self.hovered = None;
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use citycam_geo_model::{Category, MAX_ZOOM, MIN_ZOOM};
    use proptest::prelude::*;

    use super::*;

    fn registry() -> CameraRegistry {
        let cameras = vec![
            Camera::new(1, "Park", 37.87, 32.49, Category::Park),
            Camera::new(2, "Stadium", 37.90, 32.45, Category::Sports),
        ];
        CameraRegistry::new(cameras, BTreeMap::new()).unwrap()
    }

    fn controller(lat: f64, lng: f64, zoom: f64) -> InteractionController {
        let mut ctl = InteractionController::new(ViewState::new(lat, lng, zoom));
        ctl.set_viewport(ViewportSize::new(800.0, 600.0));
        ctl
    }

    #[test]
    fn test_miss_starts_drag_and_pans() {
        let reg = registry();
        let mut ctl = controller(37.0, 32.0, 14.0);
        ctl.handle(PointerEvent::Down { pos: Point2D::new(100.0, 100.0) }, &reg);
        assert!(ctl.is_dragging());
        assert_eq!(ctl.selected(), None);
        assert_eq!(ctl.cursor(), CursorHint::Grabbing);

        ctl.handle(PointerEvent::Move { pos: Point2D::new(140.0, 80.0) }, &reg);
        let (dlng, dlat) = pan_delta(40.0, -20.0, 14.0);
        assert!((ctl.view().lng() - (32.0 + dlng)).abs() < 1e-12);
        assert!((ctl.view().lat() - (37.0 + dlat)).abs() < 1e-12);
        // Dragging right moves the map centre west.
        assert!(ctl.view().lng() < 32.0);

        ctl.handle(PointerEvent::Up, &reg);
        assert!(!ctl.is_dragging());
        let settled = ctl.view();
        ctl.handle(PointerEvent::Move { pos: Point2D::new(300.0, 300.0) }, &reg);
        assert_eq!(ctl.view(), settled);
    }

    #[test]
    fn test_leave_ends_drag_and_hover() {
        let reg = registry();
        let mut ctl = controller(37.87, 32.49, 14.0);
        ctl.handle(PointerEvent::Move { pos: Point2D::new(400.0, 300.0) }, &reg);
        assert_eq!(ctl.hovered(), Some(1));
        assert_eq!(ctl.cursor(), CursorHint::Pointer);
        ctl.handle(PointerEvent::Down { pos: Point2D::new(10.0, 10.0) }, &reg);
        ctl.handle(PointerEvent::Leave, &reg);
        assert!(!ctl.is_dragging());
        assert_eq!(ctl.hovered(), None);
    }

    #[test]
    fn test_hover_does_not_select() {
        let reg = registry();
        let mut ctl = controller(37.87, 32.49, 14.0);
        ctl.handle(PointerEvent::Move { pos: Point2D::new(405.0, 303.0) }, &reg);
        assert_eq!(ctl.hovered(), Some(1));
        assert_eq!(ctl.selected(), None);
        assert_eq!(ctl.view().zoom(), 14.0);
    }

    #[test]
    fn test_pick_radius_is_strict() {
        let reg = registry();
        let view = ViewState::new(37.87, 32.49, 14.0);
        let vp = ViewportSize::new(800.0, 600.0);
        let all = CategoryFilter::all();
        assert_eq!(hit_test(reg.cameras(), &all, &view, vp, Point2D::new(417.9, 300.0)), Some(1));
        assert_eq!(hit_test(reg.cameras(), &all, &view, vp, Point2D::new(418.0, 300.0)), None);
    }

    #[test]
    fn test_hidden_category_is_not_hit() {
        let reg = registry();
        let mut ctl = controller(37.87, 32.49, 14.0);
        ctl.set_filter(CategoryFilter::only(&[Category::Sports]));
        ctl.handle(PointerEvent::Down { pos: Point2D::new(400.0, 300.0) }, &reg);
        assert_eq!(ctl.selected(), None);
        assert!(ctl.is_dragging());
    }

    #[test]
    fn test_select_never_lowers_zoom() {
        let reg = registry();
        let mut ctl = controller(37.87, 32.49, 16.5);
        ctl.handle(PointerEvent::Down { pos: Point2D::new(400.0, 300.0) }, &reg);
        assert_eq!(ctl.selected(), Some(1));
        assert_eq!(ctl.view().zoom(), 16.5);
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn test_wheel_direction_and_clamp() {
        let reg = registry();
        let mut ctl = controller(37.87, 32.49, 14.0);
        ctl.handle(PointerEvent::Wheel { delta_y: 120.0 }, &reg);
        assert!((ctl.view().zoom() - 13.7).abs() < 1e-9);
        ctl.handle(PointerEvent::Wheel { delta_y: -3.0 }, &reg);
        assert!((ctl.view().zoom() - 14.0).abs() < 1e-9);
        for _ in 0..50 {
            ctl.handle(PointerEvent::Wheel { delta_y: -1.0 }, &reg);
        }
        assert_eq!(ctl.view().zoom(), MAX_ZOOM);
        for _ in 0..50 {
            ctl.handle(PointerEvent::Wheel { delta_y: 1.0 }, &reg);
        }
        assert_eq!(ctl.view().zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_reset_restores_home() {
        let reg = registry();
        let mut ctl = controller(37.87, 32.49, 14.0);
        let home = ctl.view();
        ctl.handle(PointerEvent::Down { pos: Point2D::new(400.0, 300.0) }, &reg);
        ctl.handle(PointerEvent::Wheel { delta_y: -1.0 }, &reg);
        ctl.reset();
        assert_eq!(ctl.view(), home);
        assert_eq!(ctl.snapshot().selected, None);
    }

    proptest! {
        #[test]
        fn prop_zoom_always_in_range(deltas in proptest::collection::vec(-5.0f64..5.0, 0..80)) {
            let reg = registry();
            let mut ctl = controller(37.87, 32.49, 14.0);
            for delta_y in deltas {
                ctl.handle(PointerEvent::Wheel { delta_y }, &reg);
                let zoom = ctl.view().zoom();
                prop_assert!((MIN_ZOOM..=MAX_ZOOM).contains(&zoom));
            }
        }
    }
}
