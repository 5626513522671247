//! JSON API access.
//!
//! [`JsonTransport`] is the seam between the services and the network: it
//! takes a method, a path and an optional JSON body and returns parsed JSON,
//! failing with a status-bearing [`Error::Transport`] for non-2xx responses.
//! [`HttpTransport`] implements it with `reqwest`; [`MockTransport`] serves
//! canned responses for tests.

use crate::config::Settings;
use crate::error::{Error, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
pub use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Endpoint paths relative to the API base URL.
pub mod endpoints {
    use crate::entity::EntityId;

    pub const USERS: &str = "/users";

    pub fn user(id: EntityId) -> String {
        format!("{}/{}", USERS, id)
    }

    pub fn posts_by_user(user_id: EntityId) -> String {
        format!("/posts?userId={}", user_id)
    }

    pub fn comments_by_post(post_id: EntityId) -> String {
        format!("/comments?postId={}", post_id)
    }
}

/// Sends one JSON request.
pub trait JsonTransport: Send + Sync + 'static {
    /// Send `body` to `path` with `method`.
    ///
    /// Resolves to `Value::Null` for an empty response body.
    fn send<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: Option<Value>,
    ) -> BoxFuture<'a, Result<Value>>;
}

/// `reqwest`-backed transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured client (timeouts, proxies).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpTransport { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::network(format!("{} {} failed: {}", method, url, e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} {} returned {}", method, url, status);
            return Err(Error::status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response from {}: {}", url, e)))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl JsonTransport for HttpTransport {
    fn send<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: Option<Value>,
    ) -> BoxFuture<'a, Result<Value>> {
        self.execute(method, path, body).boxed()
    }
}

/// Typed JSON helpers over a shared transport. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn JsonTransport>,
}

impl ApiClient {
    pub fn new(transport: impl JsonTransport) -> Self {
        ApiClient {
            transport: Arc::new(transport),
        }
    }

    /// HTTP client for `settings.api_base_url`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(HttpTransport::new(settings.api_base_url.clone())?))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.request(Method::GET, path, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let value = self
            .request(Method::POST, path, Some(Self::encode(body)?))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let value = self
            .request(Method::PUT, path, Some(Self::encode(body)?))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Delete `path`, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Untyped request.
    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        self.transport.send(method, path, body).await
    }

    fn encode<B: Serialize>(body: &B) -> Result<Value> {
        serde_json::to_value(body).map_err(|e| Error::SerializationError(e.to_string()))
    }
}

/// Request seen by a [`MockTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    routes: HashMap<(Method, String), Result<Value>>,
    requests: Vec<RecordedRequest>,
    offline: bool,
}

/// In-memory transport with canned responses.
///
/// Unrouted requests fail with 404. While offline every request fails
/// without a status, like a dropped connection. Clones share routes and the
/// request log.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `response`.
    pub fn route(&self, method: Method, path: &str, response: Result<Value>) -> &Self {
        self.lock()
            .routes
            .insert((method, path.to_string()), response);
        self
    }

    /// Answer `GET path` with `value`.
    pub fn on_get(&self, path: &str, value: Value) -> &Self {
        self.route(Method::GET, path, Ok(value))
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received for `method path`.
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .count()
    }

    fn respond(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let mut state = self.lock();
        state.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.to_string(),
            body,
        });

        if state.offline {
            return Err(Error::network("Network request failed"));
        }
        state
            .routes
            .get(&(method, path.to_string()))
            .cloned()
            .unwrap_or_else(|| Err(Error::status(404)))
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JsonTransport for MockTransport {
    fn send<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: Option<Value>,
    ) -> BoxFuture<'a, Result<Value>> {
        let response = self.respond(method, path, body);
        async move { response }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Named {
        id: u64,
        name: String,
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(endpoints::USERS, "/users");
        assert_eq!(endpoints::user(3), "/users/3");
        assert_eq!(endpoints::posts_by_user(3), "/posts?userId=3");
        assert_eq!(endpoints::comments_by_post(8), "/comments?postId=8");
    }

    #[test]
    fn test_http_transport_trims_base_url() {
        let transport = HttpTransport::new("https://example.test/").expect("client builds");
        assert_eq!(transport.base_url(), "https://example.test");
    }

    #[tokio::test]
    async fn test_typed_get() {
        let mock = MockTransport::new();
        mock.on_get("/users/1", json!({ "id": 1, "name": "A" }));
        let api = ApiClient::new(mock.clone());

        let named: Named = api.get("/users/1").await.expect("get");
        assert_eq!(
            named,
            Named {
                id: 1,
                name: "A".to_string()
            }
        );
        assert_eq!(mock.count(&Method::GET, "/users/1"), 1);
    }

    #[tokio::test]
    async fn test_post_records_body() {
        let mock = MockTransport::new();
        mock.route(Method::POST, "/users", Ok(json!({ "id": 11, "name": "B" })));
        let api = ApiClient::new(mock.clone());

        let created: Named = api
            .post("/users", &json!({ "name": "B" }))
            .await
            .expect("post");

        assert_eq!(created.id, 11);
        assert_eq!(mock.requests()[0].body, Some(json!({ "name": "B" })));
    }

    #[tokio::test]
    async fn test_unrouted_is_404() {
        let api = ApiClient::new(MockTransport::new());
        let err = api.get::<Named>("/missing").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err, Error::status(404));
    }

    #[tokio::test]
    async fn test_offline_has_no_status() {
        let mock = MockTransport::new();
        mock.on_get("/users", json!([]));
        mock.set_offline(true);

        let err = ApiClient::new(mock)
            .get::<Vec<Named>>("/users")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), None);
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_deserialization_error() {
        let mock = MockTransport::new();
        mock.on_get("/users/1", json!({ "unexpected": true }));

        let err = ApiClient::new(mock).get::<Named>("/users/1").await.unwrap_err();
        assert!(matches!(err, Error::DeserializationError(_)));
    }

    #[tokio::test]
    async fn test_delete_ignores_body() {
        let mock = MockTransport::new();
        mock.route(Method::DELETE, "/users/1", Ok(json!({})));

        ApiClient::new(mock.clone())
            .delete("/users/1")
            .await
            .expect("delete");
        assert_eq!(mock.requests()[0].method, Method::DELETE);
    }
}
