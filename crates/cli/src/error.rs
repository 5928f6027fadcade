//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Refusing to overwrite a configuration file
    #[error("Configuration file already exists: {path} (use --force to overwrite)")]
    ConfigExists { path: String },

    /// Invalid command-line override
    #[error("Invalid value for {field}: {message}")]
    InvalidOverride { field: String, message: String },

    /// UDP bind failure
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn config_exists(path: impl Into<String>) -> Self {
        Self::ConfigExists { path: path.into() }
    }

    pub fn invalid_override(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            field: field.into(),
            message: message.into(),
        }
    }
}
