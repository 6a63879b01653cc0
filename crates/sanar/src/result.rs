//! Result and error types for Sanar.

use thiserror::Error;

/// Result type for Sanar operations
pub type SanarResult<T> = Result<T, SanarError>;

/// Errors that can occur in Sanar
#[derive(Debug, Error)]
pub enum SanarError {
    /// Element name is not present in the locator table. This is a caller
    /// bug: unknown names are never auto-repaired and never defaulted.
    #[error("Unknown element '{name}': not present in the locator table")]
    UnknownElement {
        /// Logical element name
        name: String,
    },

    /// A selector failed verification against the current page
    #[error("Locator '{selector}' did not match exactly one visible element")]
    Verification {
        /// The selector that failed
        selector: String,
    },

    /// Repair was attempted for an element and also failed
    #[error("Unresolvable locator for '{name}': {reason}")]
    Unresolvable {
        /// Logical element name
        name: String,
        /// Why the repair attempt failed
        reason: String,
    },

    /// Suggestion service could not be reached
    #[error("Suggestion service unavailable: {message}")]
    ServiceUnavailable {
        /// Error message
        message: String,
    },

    /// Validation comparison failed
    #[error("Validation failed: expected '{expected}', got '{actual}'")]
    Assertion {
        /// Expected value
        expected: String,
        /// Actual value read from the page
        actual: String,
    },

    /// Locator table parse or shape error
    #[error("Locator store error: {message}")]
    Store {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Page probe error (browser-side failure, not a verification miss)
    #[error("Page probe error: {message}")]
    Probe {
        /// Error message
        message: String,
    },

    /// Step plan error (duplicate or gapped order indices)
    #[error("Step plan error: {message}")]
    Plan {
        /// Error message
        message: String,
    },

    /// Fixture setup/teardown error
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// Operation not supported by this probe implementation
    #[error("Operation not supported: {operation}")]
    Unsupported {
        /// Operation name
        operation: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SanarError {
    /// Create a store error
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a probe error
    #[must_use]
    pub fn probe(message: impl Into<String>) -> Self {
        Self::Probe {
            message: message.into(),
        }
    }

    /// Create an unresolvable-locator error
    #[must_use]
    pub fn unresolvable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unresolvable {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
