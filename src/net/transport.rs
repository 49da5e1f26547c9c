//! HTTP request/response types and the transport seam.
//!
//! DESIGN
//! ======
//! `HttpTransport` is the only place bytes leave the process. The gateway
//! builds a fully-formed `HttpRequest` (headers already merged) and the
//! transport just performs it, so tests can swap in a scripted transport
//! without reimplementing header or teardown logic.
//!
//! ERROR HANDLING
//! ==============
//! Transports only ever fail with `ApiError::Network`. Any response that
//! arrives, whatever its status, is `Ok`.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::parse_error_detail;
use crate::config::Timeouts;
use crate::error::ApiError;

// =============================================================================
// REQUEST
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs, in order.
    Form(Vec<(String, String)>),
    Text(String),
}

/// Caller-side request options, before the gateway adds defaults and auth.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Caller headers; these win over gateway defaults on conflict.
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Send without the stored bearer. A 401 is then an ordinary status for
    /// the caller, not a sign-out.
    pub anonymous: bool,
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(method: Method) -> Self {
        Self { method, ..Self::default() }
    }

    #[must_use]
    pub fn post_json(body: Value) -> Self {
        Self { method: Method::POST, body: Some(RequestBody::Json(body)), ..Self::default() }
    }

    #[must_use]
    pub fn post_form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { method: Method::POST, body: Some(RequestBody::Form(pairs)), ..Self::default() }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

/// Fully-formed outbound request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    /// Path relative to the transport's base URL, or an absolute URL.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

// =============================================================================
// RESPONSE
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Server-provided `detail` message from an error body.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        parse_error_detail(&self.body)
    }

    /// Deserialize the body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MalformedResponse`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    /// Pass 2xx responses through, turn anything else into [`ApiError::Http`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] with the parsed `detail` for non-2xx statuses.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Http { status: self.status, detail: self.detail() })
        }
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform `request`. Only network-level failures are errors.
    async fn send(&self, request: HttpRequest) -> Result<ApiResponse, ApiError>;
}

/// `reqwest`-backed transport against a fixed server origin.
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build a transport for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeouts: Timeouts) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        resolve_url(&self.base_url, path)
    }
}

pub(crate) fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(&request.path);
        let builder = self.http.request(request.method, &url);
        let builder = match request.body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Form(pairs)) => builder.form(&pairs),
            Some(RequestBody::Text(text)) => builder.body(text),
            None => builder,
        };
        // Applied last so the gateway's merged headers override whatever the
        // body helpers set.
        let builder = builder.headers(request.headers);

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
