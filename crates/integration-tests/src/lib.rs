//! Integration test support for the Icycon client.
//!
//! [`MockBackend`] is an in-process HTTP server on an ephemeral port. Every
//! request it receives is recorded (method, path, headers, raw body) so tests
//! can assert on exactly what the client put on the wire. Responses are
//! scripted per method and path; unscripted routes answer 404.
//!
//! ```rust,ignore
//! let backend = MockBackend::start().await?;
//! backend.respond(Method::GET, "/api/features/", MockResponse::json(200, &json!({"features": []})));
//!
//! let client = backend.client(Arc::new(CredentialStore::in_memory()))?;
//! client.fetch_features().await?;
//!
//! assert_eq!(backend.requests()[0].path, "/api/features/");
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use icycon_client::{ApiClient, ClientConfig, CredentialStore};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;

pub use axum::http::Method;

/// One request as received by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    /// Header value as a string, if present and ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body decoded as JSON, if it is JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Body as lossy UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A scripted response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: String,
    delay: Option<Duration>,
}

impl MockResponse {
    /// JSON body with `application/json`.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, Some("application/json"), body.to_string())
    }

    /// Plain-text body.
    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status, Some("text/plain"), body.to_string())
    }

    /// No body at all.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, None, String::new())
    }

    /// Hold the response back for `delay` before answering.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn new(status: u16, content_type: Option<&'static str>, body: String) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type,
            body,
            delay: None,
        }
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        match self.content_type {
            Some(content_type) => {
                (self.status, [(header::CONTENT_TYPE, content_type)], self.body).into_response()
            }
            None => (self.status, self.body).into_response(),
        }
    }
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<(Method, String), MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process stand-in for the Icycon backend.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL of the running server, without trailing slash.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Script the response for `method` + `path`, replacing any previous one.
    pub fn respond(&self, method: Method, path: &str, response: MockResponse) {
        self.state
            .routes
            .lock()
            .insert((method, path.to_string()), response);
    }

    /// Everything received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Requests received for one path.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Forget recorded requests (scripted routes are kept).
    pub fn clear_requests(&self) {
        self.state.requests.lock().clear();
    }

    /// An [`ApiClient`] pointed at this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn client(
        &self,
        credentials: Arc<CredentialStore>,
    ) -> Result<ApiClient, Box<dyn std::error::Error>> {
        let config = ClientConfig::with_api_base(&self.url())?;
        Ok(ApiClient::new(&config, credentials)?)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        headers,
        body,
    });

    let scripted = state.routes.lock().get(&(method, path)).cloned();
    match scripted {
        Some(response) => {
            if let Some(delay) = response.delay {
                tokio::time::sleep(delay).await;
            }
            response.into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"detail":"Not found."}"#,
        )
            .into_response(),
    }
}
