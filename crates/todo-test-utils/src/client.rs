//! Authenticated HTTP client for a `TestTodoServer`.

use crate::server_harness::TestTodoServer;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;

/// Sends requests as one identity.
///
/// Responses are returned as `(status, json)`; an empty body is `Value::Null`.
pub struct TestClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl TestClient {
    pub fn new(server: &TestTodoServer, sub: &str) -> Self {
        Self {
            base_url: server.url(),
            token: server.token_for(sub),
            http: reqwest::Client::new(),
        }
    }

    /// A request builder with the bearer token already attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.expect("request should reach test server");
        let status = response.status();
        let text = response.text().await.expect("response body should be readable");
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        (status, body)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, path, None).await
    }

    /// Create a list and return its id, asserting 201.
    pub async fn create_list(&self, title: &str, description: &str) -> i64 {
        let (status, body) = self
            .post(
                "/list",
                serde_json::json!({"title": title, "description": description}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create_list failed: {body}");
        body["list_id"].as_i64().expect("list_id in response")
    }

    /// Create an item and return its id, asserting 201.
    pub async fn create_item(&self, list_id: i64, content: &str, is_complete: bool) -> i64 {
        let (status, body) = self
            .post(
                &format!("/list/{list_id}/item"),
                serde_json::json!({"content": content, "is_complete": is_complete}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create_item failed: {body}");
        body["item_id"].as_i64().expect("item_id in response")
    }
}
