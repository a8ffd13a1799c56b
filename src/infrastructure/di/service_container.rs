//! Service container for dependency injection
//!
//! Wires up all services with their dependencies. Created once at startup
//! and passed to command handlers; nothing lives in process-wide globals.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{CategoryService, RetryingRequestExecutor};
use crate::config::Settings;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::http::ApiClient;
use crate::infrastructure::sources::{FileCategorySource, HttpCategorySource};
use crate::infrastructure::traits::{
    ApiTransport, CategorySource, FileSystem, JitterSource, RandomJitter, RealFileSystem, Sleeper,
    TokioSleeper,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// API transport
    pub api: Arc<dyn ApiTransport>,

    /// Timer used between retries
    pub sleeper: Arc<dyn Sleeper>,

    /// Jitter shared by all executors
    pub jitter: Arc<dyn JitterSource>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let api = ApiClient::new(
            &settings.base_url,
            Duration::from_secs(settings.request_timeout_secs),
            settings.api_token.clone(),
        )?;
        Ok(Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(api),
            Arc::new(TokioSleeper),
            Arc::new(RandomJitter::from_entropy()),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        api: Arc<dyn ApiTransport>,
        sleeper: Arc<dyn Sleeper>,
        jitter: Arc<dyn JitterSource>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            api,
            sleeper,
            jitter,
        }
    }

    /// Executor for interactive calls.
    pub fn executor(&self) -> InfraResult<RetryingRequestExecutor> {
        let policy = self.settings.retry.to_policy()?;
        Ok(RetryingRequestExecutor::new(
            policy,
            Arc::clone(&self.sleeper),
            Arc::clone(&self.jitter),
        ))
    }

    /// Executor with the reduced limits for bulk calls.
    pub fn batch_executor(&self) -> InfraResult<RetryingRequestExecutor> {
        let policy = self.settings.batch_retry.to_policy()?;
        Ok(RetryingRequestExecutor::new(
            policy,
            Arc::clone(&self.sleeper),
            Arc::clone(&self.jitter),
        ))
    }

    /// Category source: the API endpoint, or a local JSON file when given.
    pub fn category_source(&self, file: Option<&Path>) -> Arc<dyn CategorySource> {
        match file {
            Some(path) => Arc::new(FileCategorySource::new(Arc::clone(&self.fs), path)),
            None => Arc::new(HttpCategorySource::new(
                Arc::clone(&self.api),
                self.settings.categories_endpoint.clone(),
            )),
        }
    }

    /// Category service over the selected source.
    pub fn category_service(
        &self,
        file: Option<&Path>,
        batch: bool,
    ) -> InfraResult<CategoryService> {
        let executor = if batch {
            self.batch_executor()?
        } else {
            self.executor()?
        };
        Ok(CategoryService::new(self.category_source(file), executor))
    }
}
