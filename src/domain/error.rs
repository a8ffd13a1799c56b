//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid input to the core types.
/// The tree builder and the retry executor never produce one.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid retry policy: {message}")]
    InvalidPolicy { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
