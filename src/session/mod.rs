//! Session state: the in-memory store and its durable token backends.
//!
//! SYSTEM CONTEXT
//! ==============
//! `store` is the leaf every other component depends on; `storage` is the
//! platform seam it persists through.

pub mod storage;
pub mod store;

pub use storage::{FileStorage, MemoryStorage, TokenStorage};
#[cfg(feature = "web")]
pub use storage::LocalStorage;
pub use store::{Session, SessionPhase, SessionSnapshot, SessionStore};
