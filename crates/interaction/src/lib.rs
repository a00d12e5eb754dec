//! CityCam Interaction
//!
//! Translates pointer and wheel input into map view changes. The
//! [`InteractionController`] is the single writer of [`ViewState`]: it
//! pans on drag, zooms on wheel, hit-tests markers for hover and
//! selection, and restores the default view on reset. The render loop
//! only ever sees an [`InteractionSnapshot`] copied out each tick.
//!
//! [`ViewState`]: citycam_geo_model::ViewState

pub mod controller;
pub mod event;

pub use controller::{hit_test, InteractionController, InteractionSnapshot, PICK_RADIUS};
pub use event::{CursorHint, PointerEvent};
