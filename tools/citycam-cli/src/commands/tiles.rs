//! List the basemap tiles covering a view.

use citycam_common::config::AppConfig;
use citycam_geo_model::TileGrid;

use super::resolve_view;
use crate::ViewArgs;

pub fn run(config: &AppConfig, args: ViewArgs, urls: bool) -> anyhow::Result<()> {
    let (view, viewport) = resolve_view(config, args);
    let grid = TileGrid::visible(&view, viewport);

    println!(
        "Tile zoom {} (stretch {:.3}, {:.1}px per tile): columns {}..={}, rows {}..={}",
        grid.tile_zoom,
        grid.tile_scale,
        grid.tile_size,
        grid.start_x,
        grid.end_x,
        grid.start_y,
        grid.end_y
    );
    for cell in grid.cells() {
        if urls {
            println!("{}", cell.key.url(&config.tiles.url_template));
        } else {
            println!("{:<16} at ({:>8.1}, {:>8.1})", cell.key.path(), cell.x, cell.y);
        }
    }
    println!("{} tiles", grid.cell_count());
    Ok(())
}
