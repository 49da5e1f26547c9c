//! Client-side session core for the Chic blog front end.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page embeds one [`SessionController`]. On startup it verifies the
//! persisted bearer token against `/api/v1/auth/me`; afterwards page scripts
//! send their API calls through the controller's gateway, which attaches the
//! token and turns any 401 into a sign-out.
//!
//! ARCHITECTURE
//! ============
//! - `session`: token persistence and the in-memory `{token, user}` pair
//! - `net`: wire types, the HTTP transport seam and the authenticated gateway
//! - `services::session`: the login / register / verify / logout transitions
//! - `ui`: events the core emits and the view state a renderer keeps
//! - `config`: environment-driven settings
//!
//! The core never touches a DOM. It emits [`SessionEvent`]s; whatever renders
//! the page (a browser shim, the `chic` CLI, a test) applies them.

pub mod config;
pub mod error;
pub mod net;
pub mod services;
pub mod session;
pub mod ui;

#[cfg(test)]
mod test_helpers;

pub use config::SessionConfig;
pub use error::{ActionError, ApiError, ConfigError, StorageError};
pub use net::{ApiGateway, ApiResponse, HttpTransport, RequestOptions, ReqwestTransport, UserSummary};
pub use services::session::SessionController;
pub use session::{FileStorage, MemoryStorage, SessionPhase, SessionStore, TokenStorage};
pub use ui::{EventBus, ModalId, NavView, Notification, SessionEvent, Severity, ViewState};
