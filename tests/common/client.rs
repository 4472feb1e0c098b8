// HTTP client utilities for testing

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

/// Test client for making HTTP requests
#[derive(Clone)]
pub struct TestClient {
    router: Router,
    auth_token: Option<String>,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            auth_token: None,
        }
    }

    /// Set the bearer token sent with every request (the cron secret)
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    async fn send(&self, request: axum::http::request::Builder, body: Body) -> TestResponse {
        let request = match &self.auth_token {
            Some(token) => request.header("authorization", format!("Bearer {}", token)),
            None => request,
        };
        let request = request.body(body).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();

        TestResponse::new(response).await
    }

    /// Make a GET request
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(uri), Body::empty())
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        let body_bytes = serde_json::to_vec(body).unwrap();
        self.send(request, Body::from(body_bytes)).await
    }
}

/// Test response wrapper
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Undecoded body, for tiles and downloaded results
    pub bytes: Bytes,
    pub headers: axum::http::HeaderMap,
}

impl TestResponse {
    async fn new(response: axum::response::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).to_string(),
            ))
        };

        Self {
            status,
            body,
            bytes,
            headers,
        }
    }

    /// Assert the status code
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}. Body: {}",
            expected, self.status, self.body
        );
    }

    /// Get JSON value from response
    pub fn json(&self) -> &Value {
        &self.body
    }

    /// Get header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}
