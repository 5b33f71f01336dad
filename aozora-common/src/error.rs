//! Common error types for the Aozora tools

use thiserror::Error;

/// Common result type for Aozora operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Aozora tools
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration missing or invalid (fatal, reported before any processing)
    #[error("Configuration error: {0}")]
    Config(String),
}
