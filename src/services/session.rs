//! Session lifecycle: verify, login, register, logout.
//!
//! ARCHITECTURE
//! ============
//! The controller owns no session data of its own. Phase is derived from the
//! store (`Guest` = no token, `Verifying` = token without user,
//! `Authenticated` = both), so there is exactly one place that can disagree
//! with itself and it is guarded by one mutex. All network traffic goes
//! through the gateway; all visible effects go out as `SessionEvent`s.
//!
//! ERROR HANDLING
//! ==============
//! Login and register surface every failure as an error notification and also
//! return it, so non-UI callers can set exit codes. Verify never notifies: a
//! failed verify just means "not signed in".

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::{Endpoints, SessionConfig, UiDelays};
use crate::error::{ActionError, ApiError};
use crate::net::gateway::ApiGateway;
use crate::net::transport::{ApiResponse, HttpTransport, RequestOptions, ReqwestTransport};
use crate::net::types::{LoginResponse, RegisterRequest, UserSummary};
use crate::session::{SessionPhase, SessionStore, TokenStorage};
use crate::ui::events::{EventBus, ModalId, NavView, SessionEvent, Severity};

const LOGIN_SUCCESS: &str = "Logged in successfully!";
const LOGIN_FAILED: &str = "Login failed";
const LOGIN_UNVERIFIED: &str = "Signed in, but the session could not be confirmed. Please try again.";
const REGISTER_SUCCESS: &str = "Registration successful! Now log in.";
const REGISTER_FAILED: &str = "Registration failed";
const CONNECTION_FAILED: &str = "Connection error";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Clone)]
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    store: Arc<SessionStore>,
    gateway: ApiGateway,
    events: EventBus,
    endpoints: Endpoints,
    delays: UiDelays,
}

impl SessionController {
    /// Wire a controller over an existing store and transport.
    pub fn new(store: Arc<SessionStore>, transport: Arc<dyn HttpTransport>, config: &SessionConfig) -> Self {
        let events = EventBus::default();
        let gateway = ApiGateway::new(Arc::clone(&store), transport, events.clone(), config.home_path.clone());
        Self {
            inner: Arc::new(ControllerInner {
                store,
                gateway,
                events,
                endpoints: config.endpoints.clone(),
                delays: config.delays,
            }),
        }
    }

    /// Controller talking HTTP to `config.base_url`, persisting through `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &SessionConfig, storage: Box<dyn TokenStorage>) -> Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::new(config.base_url.clone(), config.timeouts)?;
        let store = Arc::new(SessionStore::open(storage, config.token_key.clone()));
        Ok(Self::new(store, Arc::new(transport), config))
    }

    // =========================================================================
    // EXPOSED SURFACE
    // =========================================================================

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.inner.store.phase()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.store.token()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserSummary> {
        self.inner.store.user()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn gateway(&self) -> &ApiGateway {
        &self.inner.gateway
    }

    /// Authenticated request for page scripts; see [`ApiGateway::request`].
    ///
    /// # Errors
    ///
    /// Same as [`ApiGateway::request`].
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        self.inner.gateway.request(path, options).await
    }

    pub fn notify(&self, message: impl Into<String>, severity: Severity) {
        self.inner.events.notify(message, severity);
    }

    pub fn open_modal(&self, id: impl Into<ModalId>) {
        self.inner.events.emit(SessionEvent::OpenModal(id.into()));
    }

    pub fn close_modal(&self, id: impl Into<ModalId>) {
        self.inner.events.emit(SessionEvent::CloseModal(id.into()));
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Confirm the stored token with the identity endpoint.
    ///
    /// Ends in `Authenticated` on success and `Guest` (token cleared) on any
    /// failure. Safe to call repeatedly, e.g. on every startup.
    pub async fn verify(&self) -> SessionPhase {
        let store = &self.inner.store;
        if store.token().is_none() {
            self.inner.events.emit(SessionEvent::Navigation(NavView::Guest));
            return SessionPhase::Guest;
        }
        let generation = store.generation();

        match self.fetch_identity().await {
            Ok(user) => {
                let nav = NavView::Member { user_id: user.id, username: user.username.clone() };
                if store.set_user_if_current(generation, user) {
                    tracing::info!(phase = "authenticated", "session verified");
                    self.inner.events.emit(SessionEvent::Navigation(nav));
                } else {
                    tracing::debug!("discarding verify result for a superseded token");
                }
            }
            // Teardown already ran in the gateway.
            Err(ApiError::Unauthorized { .. }) => {
                tracing::info!(phase = "guest", "stored token rejected");
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "session verification failed");
                if store.clear_if_current(generation) {
                    self.inner.events.emit(SessionEvent::Navigation(NavView::Guest));
                }
            }
        }
        store.phase()
    }

    /// Exchange credentials for a token, then verify it.
    ///
    /// Only a successful verify authenticates; the login response alone never
    /// populates the user.
    ///
    /// # Errors
    ///
    /// Returns the failure after it has been shown as an error notification.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ActionError> {
        let token = match self.exchange_credentials(username, password).await {
            Ok(token) => token,
            Err(e) => {
                tracing::info!(username, error = %e, "login rejected");
                self.notify(failure_message(&e, LOGIN_FAILED), Severity::Error);
                return Err(e.into());
            }
        };

        self.inner.store.set_token(token);
        tracing::info!(username, phase = "verifying", "login accepted");

        if self.verify().await != SessionPhase::Authenticated {
            self.notify(LOGIN_UNVERIFIED, Severity::Error);
            return Err(ActionError::Unverified);
        }

        self.close_modal(ModalId::login());
        self.notify(LOGIN_SUCCESS, Severity::Success);
        self.schedule(
            self.inner.delays.session_changed,
            SessionEvent::SessionChanged(SessionPhase::Authenticated),
        );
        Ok(())
    }

    /// Create an account. Never signs in; prompts for login instead.
    ///
    /// # Errors
    ///
    /// Returns the failure after it has been shown as an error notification.
    pub async fn register(&self, email: &str, username: &str, password: &str) -> Result<(), ActionError> {
        let request = RegisterRequest {
            email: email.to_owned(),
            username: username.to_owned(),
            password: password.to_owned(),
        };
        if let Err(message) = request.validate() {
            self.notify(message.clone(), Severity::Error);
            return Err(ActionError::Invalid(message));
        }

        let result = self
            .inner
            .gateway
            .request(&self.inner.endpoints.register, RequestOptions::post_json(request.to_json()))
            .await
            .and_then(ApiResponse::error_for_status);
        if let Err(e) = result {
            tracing::info!(username = %request.username, error = %e, "registration rejected");
            self.notify(failure_message(&e, REGISTER_FAILED), Severity::Error);
            return Err(e.into());
        }

        tracing::info!(username = %request.username, "registration accepted");
        self.close_modal(ModalId::register());
        self.notify(REGISTER_SUCCESS, Severity::Success);
        self.inner
            .events
            .emit(SessionEvent::PrefillLoginUsername(request.username));
        self.schedule(self.inner.delays.login_modal, SessionEvent::OpenModal(ModalId::login()));
        Ok(())
    }

    /// Sign out: clear, show guest navigation, redirect home.
    ///
    /// Shares its teardown with the gateway's 401 handling and is safe to call
    /// when already signed out.
    pub fn logout(&self) {
        tracing::info!(was = self.phase().as_str(), "logout");
        self.inner.gateway.terminate_session();
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    async fn fetch_identity(&self) -> Result<UserSummary, ApiError> {
        self.inner
            .gateway
            .request(&self.inner.endpoints.me, RequestOptions::get())
            .await?
            .error_for_status()?
            .json::<UserSummary>()
    }

    async fn exchange_credentials(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let options = RequestOptions::post_form([("username", username), ("password", password)])
            .header("Content-Type", FORM_CONTENT_TYPE)
            .anonymous();
        let body: LoginResponse = self
            .inner
            .gateway
            .request(&self.inner.endpoints.login, options)
            .await?
            .error_for_status()?
            .json()?;
        if body.access_token.is_empty() {
            return Err(ApiError::MalformedResponse("empty access_token".into()));
        }
        Ok(body.access_token)
    }

    fn schedule(&self, delay: Duration, event: SessionEvent) {
        let events = self.inner.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            events.emit(event);
        });
    }
}

/// User-facing text for a failed action: server detail when present.
fn failure_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::Network(_) => CONNECTION_FAILED.to_owned(),
        _ => err.detail().unwrap_or(fallback).to_owned(),
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
