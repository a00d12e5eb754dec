//! Check GStreamer elements and configuration.

use std::path::PathBuf;

use citycam_common::config::{config_file_path, AppConfig};
use citycam_stream_engine::pipeline::missing_elements;

use super::load_registry;

pub fn run(
    config: &AppConfig,
    registry_path: Option<PathBuf>,
    write_config: bool,
) -> anyhow::Result<()> {
    println!("CityCam System Check");
    println!("{}", "=".repeat(50));

    let path = config_file_path();
    if write_config {
        config.save()?;
        println!("[OK] Config written: {}", path.display());
    } else if path.exists() {
        println!("[OK] Config: {}", path.display());
    } else {
        println!("[--] Config: defaults ({} not found)", path.display());
    }

    let mut ready = true;
    match load_registry(registry_path) {
        Ok(registry) => {
            let with_stream = registry
                .cameras()
                .iter()
                .filter(|c| registry.stream_id(c.id).is_some())
                .count();
            println!(
                "[OK] Registry: {} cameras, {} with streams",
                registry.len(),
                with_stream
            );
        }
        Err(e) => {
            ready = false;
            println!("[FAIL] Registry: {e}");
        }
    }

    match missing_elements() {
        Ok(missing) if missing.is_empty() => println!("[OK] GStreamer elements available"),
        Ok(missing) => {
            ready = false;
            println!("[FAIL] Missing GStreamer elements: {}", missing.join(", "));
        }
        Err(e) => {
            ready = false;
            println!("[FAIL] GStreamer: {e}");
        }
    }

    println!("[--] Stream proxy: {}", config.motion.stream_base_url);
    println!("[--] Tiles: {}", config.tiles.url_template);

    println!();
    if !ready {
        println!("Some required components are missing. See above for fixes.");
        anyhow::bail!("system check failed");
    }
    println!("All required components are available. CityCam is ready.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_check_is_an_error() {
        let missing = PathBuf::from("/nonexistent/citycam/registry.json");
        let result = run(&AppConfig::default(), Some(missing), false);
        assert!(result.is_err());
    }
}
