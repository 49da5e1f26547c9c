//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::config::SessionConfig;
use crate::error::ApiError;
use crate::net::transport::{ApiResponse, HttpRequest, HttpTransport};
use crate::net::types::UserSummary;
use crate::services::session::SessionController;
use crate::session::{MemoryStorage, SessionStore};
use crate::ui::events::SessionEvent;

pub const TOKEN_KEY: &str = "authToken";

pub fn user(id: i64, username: &str) -> UserSummary {
    UserSummary {
        id,
        username: username.to_owned(),
        email: format!("{username}@x.com"),
        extra: serde_json::Map::new(),
    }
}

// =============================================================================
// ScriptedTransport
// =============================================================================

type SendHook = Box<dyn Fn(&HttpRequest) + Send + Sync>;

/// Replies with queued responses in order and records every request.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    on_send: Option<SendHook>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<ApiResponse, ApiError>>) -> Self {
        Self { replies: Mutex::new(replies.into()), requests: Mutex::new(Vec::new()), on_send: None }
    }

    /// Run `hook` while each request is "in flight", before its reply.
    pub fn with_hook(mut self, hook: impl Fn(&HttpRequest) + Send + Sync + 'static) -> Self {
        self.on_send = Some(Box::new(hook));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<ApiResponse, ApiError> {
        if let Some(hook) = &self.on_send {
            hook(&request);
        }
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted reply left".into())))
    }
}

pub fn ok_json(status: u16, body: serde_json::Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::new(status, body.to_string()))
}

pub fn status(status: u16) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::new(status, ""))
}

pub fn network_down() -> Result<ApiResponse, ApiError> {
    Err(ApiError::Network("connection reset".into()))
}

// =============================================================================
// Controller harness
// =============================================================================

pub struct Harness {
    pub controller: SessionController,
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<MemoryStorage>,
    pub events: broadcast::Receiver<SessionEvent>,
}

impl Harness {
    /// Controller over a scripted transport, optionally with a persisted token.
    pub fn new(persisted_token: Option<&str>, replies: Vec<Result<ApiResponse, ApiError>>) -> Self {
        Self::with_transport(persisted_token, ScriptedTransport::new(replies))
    }

    pub fn with_transport(persisted_token: Option<&str>, transport: ScriptedTransport) -> Self {
        let storage = Arc::new(match persisted_token {
            Some(token) => MemoryStorage::with_entry(TOKEN_KEY, token),
            None => MemoryStorage::new(),
        });
        let store = Arc::new(SessionStore::open(Box::new(Arc::clone(&storage)), TOKEN_KEY));
        let transport = Arc::new(transport);
        let controller = SessionController::new(store, transport.clone(), &SessionConfig::default());
        let events = controller.subscribe();
        Self { controller, transport, storage, events }
    }

    /// Everything emitted so far.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    pub fn persisted_token(&self) -> Option<String> {
        use crate::session::TokenStorage;
        self.storage.load(TOKEN_KEY).unwrap()
    }
}
