pub mod cameras;
pub mod check;
pub mod diff;
pub mod project;
pub mod scan;
pub mod tiles;

use std::path::{Path, PathBuf};

use citycam_common::config::AppConfig;
use citycam_common::CitycamError;
use citycam_geo_model::{CameraRegistry, ViewState, ViewportSize};

use crate::ViewArgs;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(CitycamError::FileNotFound {
                    path: path.to_path_buf(),
                }
                .into());
            }
            let content = std::fs::read_to_string(path)?;
            let config = AppConfig::from_json(&content).map_err(|e| {
                CitycamError::config(format!("invalid config {}: {e}", path.display()))
            })?;
            Ok(config)
        }
        None => Ok(AppConfig::load()),
    }
}

pub fn load_registry(path: Option<PathBuf>) -> anyhow::Result<CameraRegistry> {
    match path {
        Some(path) => {
            let registry = CameraRegistry::load(&path).map_err(|e| {
                CitycamError::registry(format!("failed to load {}: {e}", path.display()))
            })?;
            Ok(registry)
        }
        None => Ok(CameraRegistry::builtin()),
    }
}

pub fn resolve_view(config: &AppConfig, args: ViewArgs) -> (ViewState, ViewportSize) {
    let view = ViewState::new(
        args.center_lat.unwrap_or(config.map.center_lat),
        args.center_lng.unwrap_or(config.map.center_lng),
        args.zoom.unwrap_or(config.map.zoom),
    );
    (view, ViewportSize::new(args.width, args.height))
}
