//! I/O boundary traits for testability
//!
//! These traits abstract the clock, randomness, the network and the
//! filesystem, allowing services to be tested with deterministic doubles.

use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{ApiEnvelope, Category, Outcome};

/// Suspends the current task between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Source of random jitter added to retry delays.
pub trait JitterSource: Send + Sync {
    /// Draw a duration uniformly from `[0, max)`.
    fn draw(&self, max: Duration) -> Duration;
}

/// Raw request/response access to the platform API.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// GET `path` with query pairs. Never fails: transport problems are
    /// reported inside the envelope.
    async fn get(&self, path: &str, query: &[(String, String)]) -> ApiEnvelope;
}

/// Anything that can produce the flat category list.
#[async_trait]
pub trait CategorySource: Send + Sync {
    async fn fetch_categories(&self) -> Outcome<Vec<Category>>;

    /// Human readable origin, used in logs.
    fn describe(&self) -> String;
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Uniform jitter from a shared `StdRng`.
#[derive(Debug)]
pub struct RandomJitter {
    rng: Mutex<StdRng>,
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomJitter {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible jitter sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for RandomJitter {
    fn draw(&self, max: Duration) -> Duration {
        if max.is_zero() {
            return Duration::ZERO;
        }
        let nanos = self.rng.lock().gen_range(0..max.as_nanos() as u64);
        Duration::from_nanos(nanos)
    }
}

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MAX_JITTER;

    #[test]
    fn given_seeded_jitter_when_drawing_then_stays_below_max() {
        let jitter = RandomJitter::seeded(7);
        for _ in 0..1000 {
            assert!(jitter.draw(MAX_JITTER) < MAX_JITTER);
        }
    }

    #[test]
    fn given_same_seed_when_drawing_then_sequences_match() {
        let a = RandomJitter::seeded(42);
        let b = RandomJitter::seeded(42);
        let left: Vec<_> = (0..5).map(|_| a.draw(MAX_JITTER)).collect();
        let right: Vec<_> = (0..5).map(|_| b.draw(MAX_JITTER)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn given_zero_max_when_drawing_then_zero() {
        assert_eq!(RandomJitter::seeded(1).draw(Duration::ZERO), Duration::ZERO);
    }
}
