//! Common error types for Setu

use thiserror::Error;

/// Common result type for Setu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Setu services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
