//! Request executor.
//!
//! Turns an [`ApiRequest`] into exactly one HTTP exchange with consistent
//! auth, parsing and error semantics. There is no retry; the only deadline
//! is the optional client timeout from [`ClientConfig`].

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::{ApiError, error_message};

/// Body of an outgoing request.
#[derive(Debug)]
pub enum RequestBody {
    /// Serialized as JSON; `Content-Type: application/json` unless already set.
    Json(Value),
    /// Sent as `multipart/form-data`; the boundary header comes from the form.
    Multipart(reqwest::multipart::Form),
}

/// A logical API call.
#[derive(Debug)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<RequestBody>,
    headers: HeaderMap,
    skip_auth: bool,
}

impl ApiRequest {
    /// A `GET` request for `path` (absolute URL or root-relative path).
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
            skip_auth: false,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::POST)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::PATCH)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(path).method(Method::DELETE)
    }

    /// Override the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach a multipart form body.
    #[must_use]
    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    /// Add a header. A caller-supplied `Authorization` is left untouched.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Do not attach the stored credentials.
    #[must_use]
    pub const fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    /// HTTP method of the request.
    #[must_use]
    pub const fn http_method(&self) -> &Method {
        &self.method
    }

    /// Path or URL as given.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// `204 No Content`, or an empty / `null` body.
    Empty,
    /// Body parsed as JSON.
    Json(Value),
    /// Body that was not JSON, verbatim.
    Text(String),
}

impl ResponseBody {
    /// The JSON value, if the body was JSON.
    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Empty | Self::Text(_) => None,
        }
    }

    /// Returns true for [`ResponseBody::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Client for the Icycon REST backend.
///
/// Cheap to clone; clones share the connection pool, cookie jar and
/// credential store.
#[derive(Clone, Debug)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

#[derive(Debug)]
struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<CredentialStore>,
}

impl ApiClient {
    /// Create a client for `config.api_base` reading auth from `credentials`.
    ///
    /// Cookies are kept between requests so session-cookie backends work
    /// alongside Basic auth.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, credentials: Arc<CredentialStore>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http: builder.build()?,
                base_url: config.api_base.trim_end_matches('/').to_string(),
                credentials,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The credential store this client reads auth from.
    #[must_use]
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.inner.credentials
    }

    /// Resolve a path against the base URL.
    ///
    /// Absolute http(s) URLs are used verbatim.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the result is not a valid URL.
    pub fn resolve_url(&self, path: &str) -> Result<Url, ApiError> {
        if let Ok(url) = Url::parse(path)
            && matches!(url.scheme(), "http" | "https")
        {
            return Ok(url);
        }

        let joined = if path.starts_with('/') {
            format!("{}{path}", self.inner.base_url)
        } else {
            format!("{}/{path}", self.inner.base_url)
        };
        Url::parse(&joined).map_err(|source| ApiError::InvalidUrl {
            url: joined,
            source,
        })
    }

    /// Build the outgoing HTTP request without sending it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be resolved, the JSON body cannot be
    /// encoded, or the stored credentials are not a valid header value.
    pub fn build(&self, request: ApiRequest) -> Result<reqwest::Request, ApiError> {
        let ApiRequest {
            method,
            path,
            body,
            mut headers,
            skip_auth,
        } = request;

        let url = self.resolve_url(&path)?;

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if !skip_auth
            && !headers.contains_key(AUTHORIZATION)
            && let Some(auth) = self.inner.credentials.auth_header()
        {
            let mut value = HeaderValue::from_str(auth.expose_secret())
                .map_err(|e| ApiError::InvalidHeader(format!("Authorization: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let builder = match body {
            Some(RequestBody::Json(value)) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                let bytes = serde_json::to_vec(&value)?;
                self.inner
                    .http
                    .request(method, url)
                    .headers(headers)
                    .body(bytes)
            }
            Some(RequestBody::Multipart(form)) => {
                headers.remove(CONTENT_TYPE);
                self.inner
                    .http
                    .request(method, url)
                    .headers(headers)
                    .multipart(form)
            }
            None => self.inner.http.request(method, url).headers(headers),
        };

        Ok(builder.build()?)
    }

    /// Perform one request and normalize the response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for any non-2xx response, `ApiError::Http`
    /// for transport failures, and build errors from [`ApiClient::build`].
    pub async fn request(&self, request: ApiRequest) -> Result<ResponseBody, ApiError> {
        self.exchange(request).await.map(|(_, body)| body)
    }

    /// Perform one request and decode a JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`ApiClient::request`] returns, plus
    /// `ApiError::UnexpectedBody` when the body is empty or not JSON and
    /// `ApiError::Json` when it does not match `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ApiError> {
        match self.exchange(request).await? {
            (_, ResponseBody::Json(value)) => Ok(serde_json::from_value(value)?),
            (status, ResponseBody::Empty | ResponseBody::Text(_)) => {
                Err(ApiError::UnexpectedBody {
                    status: status.as_u16(),
                })
            }
        }
    }

    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn exchange(&self, request: ApiRequest) -> Result<(StatusCode, ResponseBody), ApiError> {
        let http_request = self.build(request)?;
        tracing::debug!(url = %http_request.url(), "Sending request");

        let response = self.inner.http.execute(http_request).await?;
        let status = response.status();
        // `text()` consumes the response, so the body is read exactly once.
        let text = response.text().await?;

        interpret_response(status, text).map(|body| (status, body))
    }
}

/// Map a status and the already-read body text onto the response contract.
fn interpret_response(status: StatusCode, text: String) -> Result<ResponseBody, ApiError> {
    if !status.is_success() {
        let parsed = serde_json::from_str::<Value>(&text).ok();
        let message = error_message(status, parsed.as_ref(), &text);
        tracing::debug!(status = status.as_u16(), %message, "Request failed");
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
            body: parsed,
        });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(ResponseBody::Empty);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Null) => Ok(ResponseBody::Empty),
        Ok(value) => Ok(ResponseBody::Json(value)),
        Err(_) if text.is_empty() => Ok(ResponseBody::Empty),
        Err(_) => Ok(ResponseBody::Text(text)),
    }
}
