//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Optional camera registry JSON replacing the built-in table.
    pub registry_path: Option<PathBuf>,

    /// Default map view.
    pub map: MapDefaults,

    /// Basemap tile settings.
    pub tiles: TileConfig,

    /// Motion sampling settings.
    pub motion: MotionConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Startup (and reset) view of the map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MapDefaults {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: f64,
}

/// Basemap tile source and cache policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// URL template with `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,

    /// Whether a tile whose fetch failed may be requested again.
    ///
    /// `false` keeps the failed entry for the process lifetime.
    pub retry_failed: bool,

    /// Per-request timeout.
    pub request_timeout_secs: u64,
}

/// Motion sampling scheduler parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Base URL of the stream proxy; manifests live at
    /// `{stream_base_url}/l/{stream_id}/master.m3u8`.
    pub stream_base_url: String,

    /// Interval between frame captures while sampling.
    pub sample_interval_ms: u64,

    /// Pause between two cameras.
    pub cooldown_ms: u64,

    /// Frame differences averaged into one score.
    pub samples_per_cycle: usize,

    /// Sampling ticks after which a silent stream is abandoned.
    /// `None` waits forever.
    pub max_sampling_ticks: Option<u32>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "citycam=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry_path: None,
            map: MapDefaults::default(),
            tiles: TileConfig::default(),
            motion: MotionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self {
            center_lat: 37.870,
            center_lng: 32.488,
            zoom: 14.0,
        }
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            url_template: "https://basemaps.cartocdn.com/dark_nolabels/{z}/{x}/{y}@2x.png"
                .to_string(),
            retry_failed: false,
            request_timeout_secs: 15,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            stream_base_url: "http://localhost:3000/stream".to_string(),
            sample_interval_ms: 1500,
            cooldown_ms: 500,
            samples_per_cycle: 3,
            max_sampling_ticks: Some(20),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match Self::from_json(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Parse a config document; missing sections take their defaults.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("citycam").join("config.json")
}
