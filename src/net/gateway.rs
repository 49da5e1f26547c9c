//! Single chokepoint for every outbound API call.
//!
//! ARCHITECTURE
//! ============
//! Every request, authenticated or not, goes through `ApiGateway::request`:
//! default headers are merged with caller headers, the bearer token from the
//! store is attached, and a 401 tears the session down before the error is
//! returned. Callers never handle 401 teardown themselves. Anonymous requests
//! (the credential exchange) carry no bearer and never tear down.
//!
//! TRADE-OFFS
//! ==========
//! A 401 only tears down the session it was issued under. If the token changed
//! while the request was in flight (a newer login), the stale 401 is still
//! reported as `Unauthorized` to its caller but leaves the newer session alone.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use super::transport::{ApiResponse, HttpRequest, HttpTransport, RequestOptions};
use crate::error::ApiError;
use crate::session::SessionStore;
use crate::ui::events::{EventBus, NavView, SessionEvent};

const STATUS_UNAUTHORIZED: u16 = 401;

#[derive(Clone)]
pub struct ApiGateway {
    store: Arc<SessionStore>,
    transport: Arc<dyn HttpTransport>,
    events: EventBus,
    home_path: String,
}

impl ApiGateway {
    pub fn new(
        store: Arc<SessionStore>,
        transport: Arc<dyn HttpTransport>,
        events: EventBus,
        home_path: impl Into<String>,
    ) -> Self {
        Self { store, transport, events, home_path: home_path.into() }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Perform a request with auth attached.
    ///
    /// Non-2xx statuses other than 401 come back as `Ok` for the caller to
    /// interpret; use [`ApiResponse::error_for_status`] to convert them.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Network`] if no response arrived.
    /// - [`ApiError::Unauthorized`] on HTTP 401, after session teardown.
    ///   Anonymous requests get the 401 back as a plain response instead.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        let snapshot = self.store.snapshot();
        let anonymous = options.anonymous;
        let token = if anonymous { None } else { snapshot.session.token.as_deref() };
        let headers = merge_headers(&options.headers, token);

        tracing::debug!(method = %options.method, path, authenticated = token.is_some(), "api request");

        let request = HttpRequest { method: options.method, path: path.to_owned(), headers, body: options.body };
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(path, error = %e, "api request failed before a response");
                return Err(e);
            }
        };

        tracing::debug!(path, status = response.status(), "api response");

        if response.status() == STATUS_UNAUTHORIZED && !anonymous {
            let detail = response.detail();
            if self.store.clear_if_current(snapshot.generation) {
                tracing::info!(path, "unauthorized response; session terminated");
                self.announce_guest();
            } else {
                tracing::debug!(path, "unauthorized response for a superseded token; session kept");
            }
            return Err(ApiError::Unauthorized { detail });
        }

        Ok(response)
    }

    /// Clear the session, render guest navigation and redirect home.
    ///
    /// Safe to call when already signed out: the end state is the same.
    pub fn terminate_session(&self) {
        self.store.clear();
        self.announce_guest();
    }

    fn announce_guest(&self) {
        self.events.emit(SessionEvent::Navigation(NavView::Guest));
        self.events.emit(SessionEvent::Redirect(self.home_path.clone()));
    }
}

/// `Content-Type: application/json`, then caller headers (replacing on name
/// conflict, names compared case-insensitively), then the bearer token.
///
/// Headers with invalid names or values are skipped.
pub(crate) fn merge_headers(caller: &[(String, String)], token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in caller {
        let parsed = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        );
        match parsed {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "skipping invalid request header"),
        }
    }

    if let Some(token) = token {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("stored token is not a valid header value; sending without auth"),
        }
    }

    headers
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
