use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;

use langdrill_core::engine::{DrillEngine, EngineConfig};
use langdrill_core::thresholds::TrackerConfig;
use langdrill_core::tracker::SkillTracker;
use langdrill_core::traits::{ContentProvider, ProgressStore};
use langdrill_providers::OfflineProvider;
use langdrill_server::{create_app, AppState};
use langdrill_store::MemoryStore;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(Arc::new(OfflineProvider::seeded(7)))
}

pub fn create_test_app_with(provider: Arc<dyn ContentProvider>) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let engine = DrillEngine::new(
        Arc::clone(&store) as Arc<dyn ProgressStore>,
        provider,
        SkillTracker::new(Arc::new(TrackerConfig::default())),
        EngineConfig {
            generation_timeout: Duration::from_millis(300),
        },
    );
    let router = create_app(
        AppState::new(Arc::new(engine)),
        &["http://localhost:5173".to_string()],
    );
    TestApp { router, store }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
