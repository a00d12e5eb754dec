//! CityCam Geo Model
//!
//! Defines the core data contracts shared by the dashboard subsystems:
//! - **Cameras:** Immutable camera records and their closed category set
//! - **Registry:** The ordered camera table plus the stream-id mapping
//! - **View:** The map view state (center and zoom) and viewport size
//! - **Projection:** Spherical Web-Mercator between lng/lat and pixels
//! - **Tiles:** Basemap tile keys and the visible tile grid
//!
//! Everything here is plain data and pure functions.

pub mod camera;
pub mod projection;
pub mod registry;
pub mod tile;
pub mod view;

pub use camera::*;
pub use projection::*;
pub use registry::*;
pub use tile::*;
pub use view::*;
