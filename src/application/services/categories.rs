//! Category state service
//!
//! Holds the category forest for the rest of the application. Constructed
//! explicitly with its source and executor and passed to whoever needs it.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::services::retry::RetryingRequestExecutor;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Category, CategoryForest, CategoryId, CategoryNode, CategoryTreeBuilder, Outcome};
use crate::infrastructure::traits::CategorySource;

/// Service owning the current category forest.
pub struct CategoryService {
    source: Arc<dyn CategorySource>,
    executor: RetryingRequestExecutor,
    builder: CategoryTreeBuilder,
    forest: CategoryForest,
}

impl CategoryService {
    /// Create a service with an empty forest.
    pub fn new(source: Arc<dyn CategorySource>, executor: RetryingRequestExecutor) -> Self {
        Self {
            source,
            executor,
            builder: CategoryTreeBuilder::new(),
            forest: CategoryForest::new(),
        }
    }

    /// Fetch the flat list through the retry executor and replace the forest.
    ///
    /// On failure the previously held forest is kept.
    #[instrument(level = "debug", skip(self), fields(source = %self.source.describe()))]
    pub async fn refresh(&mut self) -> ApplicationResult<&CategoryForest> {
        let source = Arc::clone(&self.source);
        let run = self
            .executor
            .run(|| {
                let source = Arc::clone(&source);
                async move { source.fetch_categories().await }
            })
            .await;

        match run.outcome {
            Outcome::Success(categories) => {
                info!(
                    count = categories.len(),
                    attempts = run.attempts,
                    "fetched categories"
                );
                Ok(self.set_categories(&categories))
            }
            Outcome::RateLimited(limit) => Err(ApplicationError::RateLimited {
                limit,
                attempts: run.attempts,
            }),
            Outcome::OtherFailure(message) => Err(ApplicationError::Fetch {
                origin: self.source.describe(),
                message,
            }),
        }
    }

    /// Rebuild the forest from an already fetched flat list.
    pub fn set_categories(&mut self, categories: &[Category]) -> &CategoryForest {
        self.forest = self.builder.build(categories);
        debug!(
            nodes = self.forest.len(),
            roots = self.forest.root_indices().len(),
            "category forest rebuilt"
        );
        &self.forest
    }

    pub fn forest(&self) -> &CategoryForest {
        &self.forest
    }

    /// Nested nodes for menu rendering.
    pub fn tree(&self) -> Vec<CategoryNode> {
        self.forest.to_nodes()
    }

    /// Top-level categories.
    pub fn parent_categories(&self) -> Vec<&Category> {
        self.forest.roots()
    }

    pub fn category(&self, id: CategoryId) -> ApplicationResult<&Category> {
        self.forest.get(id).ok_or(ApplicationError::NotFound(id))
    }

    pub fn subcategories(&self, id: CategoryId) -> ApplicationResult<Vec<&Category>> {
        self.category(id)?;
        Ok(self.forest.children(id))
    }

    /// Root-first path ending at `id`.
    pub fn breadcrumb(&self, id: CategoryId) -> ApplicationResult<Vec<&Category>> {
        self.category(id)?;
        Ok(self.forest.ancestors(id))
    }

    /// Look a category up by display name, falling back to the English name.
    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        self.forest
            .find_by_name(name)
            .or_else(|| self.forest.find_by_name_en(name))
    }

    /// Look a category up by its English name (URL slug).
    pub fn find_by_name_en(&self, name_en: &str) -> Option<&Category> {
        self.forest.find_by_name_en(name_en)
    }
}
