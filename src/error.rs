//! Error types for the piccolor library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for piccolor operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Everything that can go wrong before, around, or (internally) during an analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// File exists but could not be decoded as an image
    #[error("Failed to load image: {message}")]
    ImageLoad {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File could not be opened or inspected
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extension is not one of the supported image formats
    #[error("Unsupported image format: {extension}")]
    UnsupportedFormat { extension: String },

    /// File is larger than the configured limit
    #[error("File too large: {size_mb:.1}MB (limit {limit_mb:.1}MB)")]
    FileTooLarge { size_mb: f64, limit_mb: f64 },

    /// Pixel buffer does not describe a usable RGB image
    #[error("Invalid pixel buffer: {reason}")]
    InvalidBuffer { reason: String },

    /// A configuration value is out of range
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidConfig { parameter: String, value: String },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AnalysisError {
    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoad {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_buffer(reason: impl Into<String>) -> Self {
        Self::InvalidBuffer {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidConfig {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Short sentence suitable for showing next to the file the user picked
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::ImageLoad { .. } => {
                "Could not decode the image. The file may be corrupted.".to_string()
            }
            AnalysisError::Io { path, .. } => {
                format!("Could not read {}.", path.display())
            }
            AnalysisError::UnsupportedFormat { extension } => format!(
                "Unsupported file type \"{extension}\". Use PNG, JPEG, BMP, GIF, TIFF or WEBP."
            ),
            AnalysisError::FileTooLarge { size_mb, limit_mb } => format!(
                "The image is {size_mb:.1}MB, larger than the {limit_mb:.0}MB limit."
            ),
            _ => "Color analysis failed. Please try a different image.".to_string(),
        }
    }
}
