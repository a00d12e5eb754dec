//! List registered cameras.

use std::path::{Path, PathBuf};

use citycam_geo_model::{Category, CategoryFilter};

use super::load_registry;

pub fn run(
    registry_path: Option<PathBuf>,
    categories: &[String],
    search: Option<&str>,
    json: bool,
    export: Option<&Path>,
) -> anyhow::Result<()> {
    let registry = load_registry(registry_path)?;

    if let Some(path) = export {
        let document = serde_json::to_string_pretty(&registry.to_file())?;
        std::fs::write(path, document)?;
        println!("Wrote {} cameras to {}", registry.len(), path.display());
        return Ok(());
    }

    let filter = if categories.is_empty() {
        CategoryFilter::all()
    } else {
        let parsed = categories
            .iter()
            .map(|name| {
                Category::parse(name).ok_or_else(|| anyhow::anyhow!("Unknown category: {name}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        CategoryFilter::only(&parsed)
    };

    let shown = registry.search(search.unwrap_or(""), &filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!("{:>4}  {:<32} {:<20} {:>10} {:>10}  STREAM", "ID", "NAME", "CATEGORY", "LAT", "LNG");
    for cam in &shown {
        println!(
            "{:>4}  {:<32} {:<20} {:>10.5} {:>10.5}  {}",
            cam.id,
            cam.name,
            cam.category.label(),
            cam.lat,
            cam.lng,
            registry.stream_id(cam.id).unwrap_or("-")
        );
    }
    println!();
    println!("{} of {} cameras", shown.len(), registry.len());
    Ok(())
}
