//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// A table failed the formatting check
    #[error("{file} is not canonically formatted (run 'sanador fmt' to rewrite it)")]
    FormatCheck {
        /// Offending file
        file: String,
    },

    /// Live check found stale locators
    #[error("{count} stale locator(s) in {file}")]
    StaleLocators {
        /// Number of entries that failed verification
        count: usize,
        /// Checked file
        file: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sanar library error
    #[error("{0}")]
    Sanar(#[from] sanar::SanarError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
