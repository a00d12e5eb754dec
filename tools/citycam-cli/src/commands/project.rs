//! Project a coordinate into viewport pixels.

use citycam_common::config::AppConfig;
use citycam_geo_model::{project, world_position};

use super::resolve_view;
use crate::ViewArgs;

pub fn run(config: &AppConfig, lng: f64, lat: f64, args: ViewArgs) -> anyhow::Result<()> {
    let (view, viewport) = resolve_view(config, args);
    let pixel = project(lng, lat, &view, viewport);
    let world = world_position(lng, lat, view.zoom());

    println!(
        "View: {:.5}, {:.5} @ z{:.2} in {}x{}",
        view.lat(),
        view.lng(),
        view.zoom(),
        viewport.width,
        viewport.height
    );
    println!("World pixel:    ({:.2}, {:.2})", world.x, world.y);
    println!("Viewport pixel: ({:.2}, {:.2})", pixel.x, pixel.y);

    let inside =
        (0.0..=viewport.width).contains(&pixel.x) && (0.0..=viewport.height).contains(&pixel.y);
    if !inside {
        println!("(outside the viewport)");
    }
    Ok(())
}
