//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! over an orchestrator wired to mock providers, publishers and product
//! source, so the HTTP surface can be exercised without external services.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use reelforge_core::{
    testing::{
        MemoryStateStore, MockProductSource, MockPublisher, MockScriptProvider, MockVideoProvider,
    },
    Config, RunDefaults, RunStateTracker,
};

/// Re-export fixtures for test convenience
pub use reelforge_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_run() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/run", json!({ "profile_id": "daily" })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub tracker: Arc<RunStateTracker>,
    pub products: Arc<MockProductSource>,
    pub script: Arc<MockScriptProvider>,
    pub video: Arc<MockVideoProvider>,
    pub publisher: Arc<MockPublisher>,
    /// Temporary directory for config files referenced by `config_path`
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with three products and full defaults.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let defaults = if test_config.with_defaults {
            fixtures::run_defaults()
        } else {
            RunDefaults::default()
        };

        let test = fixtures::orchestrator_with(
            fixtures::products(test_config.product_count),
            MemoryStateStore::new(),
            fixtures::fast_config(),
            defaults.clone(),
        );

        let config = Config {
            defaults,
            orchestrator: fixtures::fast_config(),
            ..Default::default()
        };

        let state = Arc::new(reelforge_server::state::AppState::new(
            config,
            Arc::new(test.orchestrator),
        ));
        let router = reelforge_server::api::create_router(state);

        Self {
            router,
            tracker: test.tracker,
            products: test.products,
            script: test.script,
            video: test.video,
            publisher: test.publisher,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body, "application/json").await
    }

    /// Send a POST request with custom content type.
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        self.request_raw("POST", path, body, content_type).await
    }

    /// Fetch the raw text body of a GET request (for non-JSON endpoints).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Poll `/status/<job_id>` until the job is completed or failed.
    pub async fn wait_for_job(&self, job_id: &str) -> Value {
        for _ in 0..500 {
            let response = self.get(&format!("/status/{}", job_id)).await;
            let status = response.body["status"].as_str().unwrap_or_default();
            if status == "completed" || status == "failed" {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish in time", job_id);
    }

    /// Send a request with raw string body and custom content type.
    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Number of products in the mock product list
    pub product_count: usize,
    /// Whether server defaults carry project and data source identifiers
    pub with_defaults: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            product_count: 3,
            with_defaults: true,
        }
    }
}

impl TestConfig {
    /// Create config whose defaults lack identifiers.
    pub fn without_defaults() -> Self {
        Self {
            with_defaults: false,
            ..Default::default()
        }
    }

    /// Create config with `n` products.
    pub fn with_products(n: usize) -> Self {
        Self {
            product_count: n,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
