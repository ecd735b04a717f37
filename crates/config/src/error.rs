//! Error types for the configuration module

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A generic error with a message
    #[error("Error: {0}")]
    Generic(String),

    /// An error that occurred during parsing
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A parameter set that the executor cannot run with
    #[error("Invalid parameter '{key}': {reason}")]
    InvalidParameter {
        /// The offending key.
        key: &'static str,
        /// Why the value is rejected.
        reason: String,
    },
}
