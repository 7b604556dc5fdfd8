// src/error.rs

//! Unified error handling for the bulletin application.

use std::fmt;

use thiserror::Error;

/// Result type alias for bulletin operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// PDF could not be read
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Image encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Font file could not be parsed
    #[error("Font error for {path}: {message}")]
    Font { path: String, message: String },

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bulletin index did not have the expected shape
    #[error("Bulletin index error: {0}")]
    Bulletin(String),

    /// Era date could not be derived from link text
    #[error("No era date found in '{0}'")]
    Date(String),

    /// PDF table did not have the expected layout
    #[error("Table error for {context}: {message}")]
    Table { context: String, message: String },

    /// Municipality keys differ between the two tables
    #[error("Join error: {0}")]
    Join(String),

    /// Social-media API rejected a request
    #[error("Publish error during {stage}: {message}")]
    Publish { stage: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a bulletin index error.
    pub fn bulletin(message: impl Into<String>) -> Self {
        Self::Bulletin(message.into())
    }

    /// Create a table layout error with context.
    pub fn table(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Table {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a font loading error.
    pub fn font(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Font {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a publish error for the given API stage.
    pub fn publish(stage: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Publish {
            stage: stage.into(),
            message: message.to_string(),
        }
    }
}
