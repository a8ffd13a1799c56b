//! Application-level errors (wraps domain errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{CategoryId, DomainError, RateLimit};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("fetch from {origin} failed: {message}")]
    Fetch { origin: String, message: String },

    #[error("{limit}, giving up after {attempts} attempts")]
    RateLimited { limit: RateLimit, attempts: u32 },

    #[error("category not found: {0}")]
    NotFound(CategoryId),

    #[error("cannot {action} {}", path.display())]
    ConfigFile {
        action: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
