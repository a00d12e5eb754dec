//! Error types shared across CityCam crates.

use std::path::PathBuf;

/// Top-level error type for CityCam operations.
#[derive(Debug, thiserror::Error)]
pub enum CitycamError {
    #[error("Stream error: {message}")]
    Stream { message: String },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Tile error: {message}")]
    Tile { message: String },

    #[error("Registry error: {message}")]
    Registry { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using CitycamError.
pub type CitycamResult<T> = Result<T, CitycamError>;

impl CitycamError {
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream {
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn tile(msg: impl Into<String>) -> Self {
        Self::Tile {
            message: msg.into(),
        }
    }

    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error belongs to the recoverable stream family
    /// (missing mapping, manifest or decode failure).
    pub fn is_stream_failure(&self) -> bool {
        matches!(self, Self::Stream { .. } | Self::Decode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_message() {
        let err = CitycamError::tile("404 for 14/9574/6312");
        assert_eq!(err.to_string(), "Tile error: 404 for 14/9574/6312");
    }

    #[test]
    fn test_stream_failure_family() {
        assert!(CitycamError::stream("manifest").is_stream_failure());
        assert!(CitycamError::decode("bad frame").is_stream_failure());
        assert!(!CitycamError::render("surface").is_stream_failure());
    }
}
