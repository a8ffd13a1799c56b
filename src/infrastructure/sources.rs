//! Category sources: the HTTP API and local JSON snapshots.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::{Category, Outcome};
use crate::infrastructure::traits::{ApiTransport, CategorySource, FileSystem};

/// Endpoint returning every category, subcategories included.
pub const ALL_CATEGORIES_ENDPOINT: &str = "categories/all";

/// Fetches the flat category list over an [`ApiTransport`].
pub struct HttpCategorySource {
    transport: Arc<dyn ApiTransport>,
    endpoint: String,
}

impl HttpCategorySource {
    pub fn new(transport: Arc<dyn ApiTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn all_categories(transport: Arc<dyn ApiTransport>) -> Self {
        Self::new(transport, ALL_CATEGORIES_ENDPOINT)
    }
}

#[async_trait]
impl CategorySource for HttpCategorySource {
    async fn fetch_categories(&self) -> Outcome<Vec<Category>> {
        let envelope = self.transport.get(&self.endpoint, &[]).await;
        decode_outcome(Outcome::from_envelope(envelope))
    }

    fn describe(&self) -> String {
        format!("api:{}", self.endpoint)
    }
}

/// Reads categories from a JSON file (array, or `{"results": [...]}`).
pub struct FileCategorySource {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileCategorySource {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }
}

#[async_trait]
impl CategorySource for FileCategorySource {
    async fn fetch_categories(&self) -> Outcome<Vec<Category>> {
        debug!("reading categories from {}", self.path.display());
        if !self.fs.exists(&self.path) {
            return Outcome::OtherFailure(format!("file not found: {}", self.path.display()));
        }
        let content = match self.fs.read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                return Outcome::OtherFailure(format!("read {}: {}", self.path.display(), e));
            }
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(value) => decode_outcome(Outcome::Success(value)),
            Err(e) => Outcome::OtherFailure(format!("parse {}: {}", self.path.display(), e)),
        }
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

fn decode_outcome(outcome: Outcome<Value>) -> Outcome<Vec<Category>> {
    match outcome {
        Outcome::Success(value) => match decode_categories(value) {
            Ok(categories) => Outcome::Success(categories),
            Err(message) => Outcome::OtherFailure(message),
        },
        Outcome::RateLimited(limit) => Outcome::RateLimited(limit),
        Outcome::OtherFailure(message) => Outcome::OtherFailure(message),
    }
}

/// Decode a category list payload; paginated `{"results": [...]}` is unwrapped.
pub fn decode_categories(value: Value) -> Result<Vec<Category>, String> {
    let list = match value {
        Value::Object(mut map) if map.contains_key("results") => map
            .remove("results")
            .unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(list).map_err(|e| format!("decode categories: {e}"))
}
