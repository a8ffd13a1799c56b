//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod outcome;
pub mod retry;

pub use arena::{CategoryForest, ForestNode};
pub use builder::CategoryTreeBuilder;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use outcome::{ApiEnvelope, Outcome, RateLimit};
pub use retry::{RetryPolicy, MAX_JITTER, SLOW_UPSTREAM_FLOOR};
