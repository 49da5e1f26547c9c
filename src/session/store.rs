//! Single source of truth for the bearer token and the validated user.
//!
//! DESIGN
//! ======
//! Token and user live behind one mutex, so `clear` can never be observed
//! half-done. Only the token is persisted; the user must be re-derived by
//! verification after every fresh load.
//!
//! Every token change bumps a generation counter. Requests capture the
//! generation when they start, and the `*_if_current` mutators refuse to apply
//! a response that belongs to a token the store no longer holds.

use std::sync::Mutex;

use super::storage::TokenStorage;
use crate::net::types::UserSummary;

/// Session state as seen by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// No token.
    Guest,
    /// Token present, user not yet confirmed.
    Verifying,
    /// Token present and confirmed by the identity endpoint.
    Authenticated,
}

impl SessionPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Verifying => "verifying",
            Self::Authenticated => "authenticated",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserSummary>,
}

impl Session {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match (&self.token, &self.user) {
            (None, _) => SessionPhase::Guest,
            (Some(_), None) => SessionPhase::Verifying,
            (Some(_), Some(_)) => SessionPhase::Authenticated,
        }
    }
}

/// Point-in-time copy of the store, taken when a request starts.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub session: Session,
    pub generation: u64,
}

struct StoreInner {
    session: Session,
    generation: u64,
}

pub struct SessionStore {
    inner: Mutex<StoreInner>,
    storage: Box<dyn TokenStorage>,
    key: String,
}

impl SessionStore {
    /// Open the store, picking up a token left by a previous load.
    ///
    /// An unreadable backend is treated as "no session".
    #[must_use]
    pub fn open(storage: Box<dyn TokenStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let token = match storage.load(&key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted token; starting as guest");
                None
            }
        };
        tracing::debug!(restored = token.is_some(), "session store opened");
        Self {
            inner: Mutex::new(StoreInner { session: Session { token, user: None }, generation: 0 }),
            storage,
            key,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.lock().session.token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserSummary> {
        self.lock().session.user.clone()
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.lock().session.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot { session: inner.session.clone(), generation: inner.generation }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.lock().session.phase()
    }

    /// Store a new token in memory and in durable storage. The token is not
    /// validated, and any previously confirmed user is dropped with the old
    /// token.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        let mut inner = self.lock();
        if let Err(e) = self.storage.save(&self.key, &token) {
            tracing::warn!(error = %e, "failed to persist token; session will not survive a reload");
        }
        inner.session = Session { token: Some(token), user: None };
        inner.generation += 1;
    }

    /// Record the validated user. Requires a token; without one the call is
    /// ignored and `false` is returned.
    pub fn set_user(&self, user: UserSummary) -> bool {
        let mut inner = self.lock();
        if inner.session.token.is_none() {
            tracing::error!(user_id = user.id, "set_user called without a token; ignoring");
            return false;
        }
        inner.session.user = Some(user);
        true
    }

    /// `set_user`, but only while the token from `generation` is still held.
    pub fn set_user_if_current(&self, generation: u64, user: UserSummary) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation || inner.session.token.is_none() {
            return false;
        }
        inner.session.user = Some(user);
        true
    }

    /// Remove token and user together, in memory and in durable storage.
    pub fn clear(&self) {
        let mut inner = self.lock();
        self.clear_locked(&mut inner);
    }

    /// `clear`, but only while the token from `generation` is still held.
    /// Returns whether the clear happened.
    pub fn clear_if_current(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        self.clear_locked(&mut inner);
        true
    }

    fn clear_locked(&self, inner: &mut StoreInner) {
        if let Err(e) = self.storage.remove(&self.key) {
            tracing::warn!(error = %e, "failed to remove persisted token");
        }
        inner.session = Session::default();
        inner.generation += 1;
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionStore")
            .field("phase", &inner.session.phase())
            .field("generation", &inner.generation)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
