//! CityCam Common Utilities
//!
//! Shared infrastructure for all CityCam crates:
//! - Error types and result aliases
//! - Animation phase clock used by the render loop
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
