//! CityCam Render Engine
//!
//! Builds the map frame for every display refresh.
//!
//! # Pipeline
//!
//! ```text
//! TileCache ──(ready tiles)──┐
//!                            ├──► RenderLoop::tick ──► [DrawCommand] ──► UI backend
//! InteractionSnapshot ───────┤         │
//! visible cameras ───────────┘         └──► HeatLayer (RGBA raster)
//! ```
//!
//! The engine has no window or GPU dependency. A backend replays the
//! display list in order; the dashboard app does this with egui.

pub mod heat;
pub mod render_loop;
pub mod scene;
pub mod tiles;

pub use heat::HeatLayer;
pub use render_loop::{Frame, FrameInput, RenderLoop};
pub use scene::{DrawCommand, FontWeight, LabelSpec, Rect, Rgba, Stroke};
pub use tiles::{HttpTileFetcher, TileCache, TileEntry, TileFetcher, TileImage, TileState};
