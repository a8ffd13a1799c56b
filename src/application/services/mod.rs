//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (Sleeper, CategorySource, etc.)
//! but are themselves concrete structs, not traits.

mod categories;
mod retry;

pub use categories::CategoryService;
pub use retry::{RetryRun, RetryingRequestExecutor};
