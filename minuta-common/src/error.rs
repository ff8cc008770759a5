//! Common error types for Minuta

use thiserror::Error;

/// Common result type for Minuta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Minuta components
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External service returned output that failed normalization
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
