//! CityCam CLI — headless tools for the camera dashboard.
//!
//! Usage:
//!   citycam cameras            List registered cameras
//!   citycam project LNG LAT    Project a coordinate into a viewport
//!   citycam tiles              List the basemap tiles covering a view
//!   citycam scan               Run motion sampling cycles
//!   citycam diff A B           Score the change between two images
//!   citycam check              Check GStreamer elements and configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "citycam",
    about = "City camera map and motion activity tools",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the standard location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Camera registry JSON, overriding the config and built-in table
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// View options shared by the map commands. Unset values come from the
/// configured default view.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct ViewArgs {
    /// View centre latitude
    #[arg(long, allow_negative_numbers = true)]
    center_lat: Option<f64>,

    /// View centre longitude
    #[arg(long, allow_negative_numbers = true)]
    center_lng: Option<f64>,

    /// Zoom level (clamped to 12..=18)
    #[arg(long)]
    zoom: Option<f64>,

    /// Viewport width in pixels
    #[arg(long, default_value = "800")]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value = "600")]
    height: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered cameras
    Cameras {
        /// Only show these categories (park, historic, square, sports)
        #[arg(short, long)]
        category: Vec<String>,

        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Write the full registry document (cameras and streams) to a file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Project a coordinate into viewport pixels
    Project {
        /// Longitude
        #[arg(allow_negative_numbers = true)]
        lng: f64,

        /// Latitude
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// List the basemap tiles covering a view
    Tiles {
        #[command(flatten)]
        view: ViewArgs,

        /// Print full tile URLs
        #[arg(long)]
        urls: bool,
    },

    /// Run motion sampling cycles against live streams
    Scan {
        /// Number of camera visits (defaults to one full rotation)
        #[arg(short = 'n', long)]
        cycles: Option<usize>,

        /// Stream proxy base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Print the final score map as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score the change between two images
    Diff {
        /// Earlier image
        a: PathBuf,

        /// Later image
        b: PathBuf,
    },

    /// Check GStreamer elements and configuration
    Check {
        /// Write the effective configuration to the standard location
        #[arg(long)]
        write_config: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    citycam_common::logging::init_logging(&citycam_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    let config = commands::load_config(cli.config.as_deref())?;
    let registry_path = cli.registry.or_else(|| config.registry_path.clone());

    match cli.command {
        Commands::Cameras {
            category,
            search,
            json,
            export,
        } => commands::cameras::run(
            registry_path,
            &category,
            search.as_deref(),
            json,
            export.as_deref(),
        ),
        Commands::Project { lng, lat, view } => commands::project::run(&config, lng, lat, view),
        Commands::Tiles { view, urls } => commands::tiles::run(&config, view, urls),
        Commands::Scan {
            cycles,
            base_url,
            json,
        } => commands::scan::run(config, registry_path, cycles, base_url, json).await,
        Commands::Diff { a, b } => commands::diff::run(a, b),
        Commands::Check { write_config } => {
            commands::check::run(&config, registry_path, write_config)
        }
    }
}
