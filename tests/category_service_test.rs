//! Tests for CategoryService

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use goalcore::application::services::{CategoryService, RetryingRequestExecutor};
use goalcore::application::ApplicationError;
use goalcore::domain::{ApiEnvelope, Category, Outcome, RateLimit, RetryPolicy};
use goalcore::infrastructure::sources::HttpCategorySource;
use goalcore::infrastructure::traits::{ApiTransport, CategorySource, JitterSource, Sleeper};

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

struct NoJitter;

impl JitterSource for NoJitter {
    fn draw(&self, _max: Duration) -> Duration {
        Duration::ZERO
    }
}

/// Replays queued outcomes; repeats the last one when the queue runs dry.
struct ScriptedSource {
    script: Mutex<VecDeque<Outcome<Vec<Category>>>>,
    calls: Mutex<u32>,
}

impl ScriptedSource {
    fn new(script: Vec<Outcome<Vec<Category>>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> u32 {
        *self.calls.lock()
    }
}

#[async_trait]
impl CategorySource for ScriptedSource {
    async fn fetch_categories(&self) -> Outcome<Vec<Category>> {
        *self.calls.lock() += 1;
        let mut script = self.script.lock();
        if script.len() > 1 {
            script.pop_front().unwrap_or(Outcome::OtherFailure("empty script".into()))
        } else {
            script
                .front()
                .cloned()
                .unwrap_or(Outcome::OtherFailure("empty script".into()))
        }
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

fn executor(policy: RetryPolicy) -> RetryingRequestExecutor {
    RetryingRequestExecutor::new(policy, Arc::new(NoSleep), Arc::new(NoJitter))
}

fn sample() -> Vec<Category> {
    vec![
        Category::new(1, "Спорт", None).with_name_en("sport"),
        Category::new(2, "Бег", Some(1)).with_name_en("running"),
        Category::new(3, "Марафон", Some(2)).with_name_en("marathon"),
        Category::new(4, "Книги", None).with_name_en("books"),
    ]
}

#[tokio::test]
async fn given_successful_source_when_refreshing_then_builds_forest() {
    // Arrange
    let source = ScriptedSource::new(vec![Outcome::Success(sample())]);
    let mut service = CategoryService::new(source.clone(), executor(RetryPolicy::standard()));

    // Act
    service.refresh().await.expect("refresh");

    // Assert
    let roots: Vec<_> = service.parent_categories().iter().map(|c| c.id).collect();
    assert_eq!(roots, vec![1, 4]);
    assert_eq!(service.tree()[0].count(), 3);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn given_rate_limit_then_success_when_refreshing_then_retries_transparently() {
    let source = ScriptedSource::new(vec![
        Outcome::RateLimited(RateLimit::new(Some(1.0), None)),
        Outcome::Success(sample()),
    ]);
    let mut service = CategoryService::new(source.clone(), executor(RetryPolicy::standard()));

    service.refresh().await.expect("refresh");

    assert_eq!(source.calls(), 2);
    assert_eq!(service.forest().len(), 4);
}

#[tokio::test]
async fn given_loaded_forest_when_refresh_fails_then_previous_forest_is_kept() {
    // Arrange
    let source = ScriptedSource::new(vec![
        Outcome::Success(sample()),
        Outcome::OtherFailure("server error".into()),
    ]);
    let mut service = CategoryService::new(source, executor(RetryPolicy::standard()));
    service.refresh().await.expect("first refresh");

    // Act
    let result = service.refresh().await;

    // Assert
    match result {
        Err(ApplicationError::Fetch { origin, message }) => {
            assert_eq!(origin, "scripted");
            assert_eq!(message, "server error");
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
    assert_eq!(service.forest().len(), 4);
}

#[tokio::test]
async fn given_persistent_rate_limit_when_refreshing_then_reports_attempts() {
    let source = ScriptedSource::new(vec![Outcome::RateLimited(RateLimit::new(None, Some("IGDB")))]);
    let mut service = CategoryService::new(source.clone(), executor(RetryPolicy::batch()));

    let result = service.refresh().await;

    match result {
        Err(ApplicationError::RateLimited { limit, attempts }) => {
            assert_eq!(limit.source(), "IGDB");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected rate limit, got {other:?}"),
    }
    assert_eq!(source.calls(), 3);
    assert!(service.forest().is_empty());
}

#[tokio::test]
async fn given_loaded_forest_when_querying_then_navigates_hierarchy() {
    // Arrange
    let source = ScriptedSource::new(vec![Outcome::Success(sample())]);
    let mut service = CategoryService::new(source, executor(RetryPolicy::standard()));
    service.refresh().await.expect("refresh");

    // Act
    let breadcrumb: Vec<_> = service
        .breadcrumb(3)
        .expect("breadcrumb")
        .iter()
        .map(|c| c.id)
        .collect();
    let children: Vec<_> = service
        .subcategories(1)
        .expect("children")
        .iter()
        .map(|c| c.id)
        .collect();

    // Assert
    assert_eq!(breadcrumb, vec![1, 2, 3]);
    assert_eq!(children, vec![2]);
    assert_eq!(service.find_by_name("Книги").map(|c| c.id), Some(4));
    assert_eq!(service.find_by_name("Running").map(|c| c.id), Some(2));
    assert!(matches!(service.category(99), Err(ApplicationError::NotFound(99))));
}

/// Serves one canned envelope for every request.
struct CannedApi {
    envelope: ApiEnvelope,
    paths: Mutex<Vec<String>>,
}

#[async_trait]
impl ApiTransport for CannedApi {
    async fn get(&self, path: &str, _query: &[(String, String)]) -> ApiEnvelope {
        self.paths.lock().push(path.to_string());
        self.envelope.clone()
    }
}

#[tokio::test]
async fn given_paginated_api_payload_when_refreshing_then_unwraps_results() {
    // Arrange
    let api = Arc::new(CannedApi {
        envelope: ApiEnvelope::success(json!({
            "count": 2,
            "results": [
                {"id": 1, "name": "Игры", "nameEn": "games"},
                {"id": 2, "name": "RPG", "parentCategory": 1}
            ]
        })),
        paths: Mutex::new(Vec::new()),
    });
    let source = Arc::new(HttpCategorySource::all_categories(api.clone()));
    let mut service = CategoryService::new(source, executor(RetryPolicy::standard()));

    // Act
    service.refresh().await.expect("refresh");

    // Assert
    assert_eq!(*api.paths.lock(), vec!["categories/all".to_string()]);
    assert_eq!(service.forest().child_ids(1), vec![2]);
}

#[tokio::test]
async fn given_structured_rate_limit_envelope_when_refreshing_then_surfaces_api_name() {
    let api = Arc::new(CannedApi {
        envelope: ApiEnvelope::failure(Some(json!({"retry_after": 0.0, "api_name": "Steam"}))),
        paths: Mutex::new(Vec::new()),
    });
    let source = Arc::new(HttpCategorySource::all_categories(api.clone()));
    let mut service = CategoryService::new(source, executor(RetryPolicy::batch()));

    let err = service.refresh().await.expect_err("rate limited");

    assert!(err.to_string().contains("Steam"), "{err}");
    assert_eq!(api.paths.lock().len(), 3);
}
