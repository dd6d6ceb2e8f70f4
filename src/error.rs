//! Error types for the job harvester.
//!
//! Only resource acquisition (cookie jar, configuration, HTTP client, cache
//! and export files) produces a `HarvestError`. Per-record failures inside the
//! pipeline are modelled as data and never surface here.

use thiserror::Error;

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

/// Errors that can stop a harvest run before or after the pipeline itself.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Invalid or malformed URL in configuration
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Cookie jar could not be read or parsed
    #[error("Cookie jar error (line {line}): {message}")]
    CookieJar { line: usize, message: String },

    /// Description cache could not be persisted
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Settings file is unreadable or invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Qualified results could not be written
    #[error("Export error: {0}")]
    ExportError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl HarvestError {
    /// Create a cookie jar error for a given (1-based) line
    pub fn cookie_jar(line: usize, msg: impl Into<String>) -> Self {
        Self::CookieJar {
            line,
            message: msg.into(),
        }
    }

    /// Create a cache persistence error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::CacheError(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an export error
    pub fn export(msg: impl Into<String>) -> Self {
        Self::ExportError(msg.into())
    }
}

/// Result type alias using HarvestError.
pub type Result<T> = std::result::Result<T, HarvestError>;
