//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use ranni_core::{ApiError, TransportError};

/// Errors that can occur while setting up or running the engine.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The gateway stream or HTTP client could not be set up.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A cron expression failed to parse at registration.
    #[error("Invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
