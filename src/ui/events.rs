//! Session events emitted to the rendering layer.
//!
//! DESIGN
//! ======
//! The session core never touches presentation. Every visible effect of a
//! transition (navigation swap, notice, modal change, redirect) is an event on
//! a broadcast bus; renderers subscribe and apply them in order.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::session::SessionPhase;

const DEFAULT_BUS_CAPACITY: usize = 64;

/// How long a notification stays on screen.
pub const NOTIFICATION_DISPLAY: Duration = Duration::from_secs(3);

// =============================================================================
// SEVERITY / NOTIFICATION
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(UnknownSeverity(other.to_owned())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self { message: message.into(), severity }
    }
}

// =============================================================================
// MODALS / NAVIGATION
// =============================================================================

/// Modal identifier, matching the element id the page uses.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModalId(String);

impl ModalId {
    pub const LOGIN: &'static str = "loginModal";
    pub const REGISTER: &'static str = "registerModal";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn login() -> Self {
        Self::new(Self::LOGIN)
    }

    #[must_use]
    pub fn register() -> Self {
        Self::new(Self::REGISTER)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ModalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which navigation bar to show.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NavView {
    #[default]
    Guest,
    Member { user_id: i64, username: String },
}

// =============================================================================
// EVENTS
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Re-render the navigation bar.
    Navigation(NavView),
    Notify(Notification),
    OpenModal(ModalId),
    CloseModal(ModalId),
    /// Put a username into the login form.
    PrefillLoginUsername(String),
    /// Navigate to a destination path.
    Redirect(String),
    /// Server-rendered content may now be stale; renderers refresh what they
    /// show for the new session.
    SessionChanged(SessionPhase),
}

/// Broadcast bus shared by the gateway, the controller and any renderers.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: SessionEvent) {
        tracing::trace!(?event, "session event");
        let _ = self.tx.send(event);
    }

    pub fn notify(&self, message: impl Into<String>, severity: Severity) {
        self.emit(SessionEvent::Notify(Notification::new(message, severity)));
    }
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
