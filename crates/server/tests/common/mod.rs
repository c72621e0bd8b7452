//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! backed by a real `JobManager` over a `MockExtractionService`, so jobs run
//! end to end without yt-dlp.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tonegrab_core::{
    gateway::ServiceGateway, testing::MockExtractionService, Config, ExtractionGateway,
    JobManager, ManagerConfig, ProgressConfig, RetryConfig,
};
use tonegrab_server::api::{create_router, WsBroadcaster};
use tonegrab_server::state::AppState;

/// Re-export fixtures for test convenience
pub use tonegrab_core::testing::fixtures;

/// Output directory every fixture job writes under.
pub const OUTPUT_DIR: &str = "/music";

/// Test fixture for API testing with a mock extraction service.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_job_creation() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/jobs", json!({
///         "url": "https://www.youtube.com/watch?v=abc"
///     })).await;
///
///     assert_eq!(response.status, 202);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock extraction service - configure metadata and outcomes
    pub service: MockExtractionService,
    /// Shared state behind the router
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let service = MockExtractionService::new();

        let mut config = Config::default();
        config.downloads.output_dir = OUTPUT_DIR.into();
        config.progress = ProgressConfig::unthrottled();
        config.retry = RetryConfig::default().with_delay_ms(1);
        config.manager = ManagerConfig::default().with_cancel_grace_ms(test_config.cancel_grace_ms);

        let gateway: Arc<dyn ExtractionGateway> = Arc::new(ServiceGateway::new(service.clone()));
        let manager = Arc::new(JobManager::from_config(gateway, &config));

        let state = Arc::new(AppState::new(config, manager, WsBroadcaster::default()));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            service,
            state,
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

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Fetch the raw text body of a GET request.
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
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Poll a job until it is no longer active and return its final record.
    pub async fn wait_for_job(&self, id: u64) -> Value {
        let path = format!("/api/v1/jobs/{}", id);
        let poll = async {
            loop {
                let response = self.get(&path).await;
                if response.status == StatusCode::OK && response.body["active"] == false {
                    return response.body;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), poll)
            .await
            .expect("job did not finish in time")
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
    /// Grace period before a cancelled job is aborted
    pub cancel_grace_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            cancel_grace_ms: 3000,
        }
    }
}

impl TestConfig {
    /// Config with a short escalation window for stuck-job tests.
    pub fn with_short_grace() -> Self {
        Self {
            cancel_grace_ms: 100,
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
