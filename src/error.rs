// src/error.rs

//! Unified error handling for the dashboard.

use std::fmt;

use thiserror::Error;

/// Result type alias for dashboard operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed (transport error or non-success status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credentials were rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Dashboard access without the session flag
    #[error("Not logged in. Run `visa-slots login` first")]
    NotAuthenticated,

    /// No record matched a lookup
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an authentication error.
    pub fn auth(message: impl fmt::Display) -> Self {
        Self::Auth(message.to_string())
    }

    /// Create a lookup error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
