//! Rendering-side state driven by session events.
//!
//! SYSTEM CONTEXT
//! ==============
//! `ViewState` is what a page renderer would hold: the current navigation,
//! which modals are open, visible notifications, the login form pre-fill and
//! the last redirect. It is a pure reducer over `SessionEvent`, so it can be
//! driven by the live bus (`spawn_view`) or replayed in tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::events::{ModalId, NOTIFICATION_DISPLAY, NavView, Notification, SessionEvent};
use super::nav::{NavLink, nav_links};

const EXPIRY_SWEEP: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModalState {
    #[default]
    Closed,
    Open,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleNotification {
    pub notification: Notification,
    pub shown_at: Instant,
}

#[derive(Clone, Debug, Default)]
pub struct ViewState {
    pub nav: NavView,
    modals: BTreeMap<ModalId, ModalState>,
    pub notifications: Vec<VisibleNotification>,
    /// Username field of the login form.
    pub login_username: String,
    /// Destination of the most recent redirect.
    pub location: Option<String>,
    pub redirect_count: u32,
    pub session_change_count: u32,
}

impl ViewState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &SessionEvent) {
        self.apply_at(event, Instant::now());
    }

    /// Internal: apply with explicit timestamp (for testing).
    pub(crate) fn apply_at(&mut self, event: &SessionEvent, now: Instant) {
        match event {
            SessionEvent::Navigation(nav) => self.nav = nav.clone(),
            SessionEvent::Notify(notification) => {
                self.notifications.push(VisibleNotification { notification: notification.clone(), shown_at: now });
            }
            SessionEvent::OpenModal(id) => {
                self.modals.insert(id.clone(), ModalState::Open);
            }
            SessionEvent::CloseModal(id) => {
                self.modals.insert(id.clone(), ModalState::Closed);
            }
            SessionEvent::PrefillLoginUsername(username) => self.login_username.clone_from(username),
            SessionEvent::Redirect(location) => {
                self.location = Some(location.clone());
                self.redirect_count += 1;
            }
            SessionEvent::SessionChanged(_) => self.session_change_count += 1,
        }
    }

    #[must_use]
    pub fn modal(&self, id: &ModalId) -> ModalState {
        self.modals.get(id).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_open(&self, id: &ModalId) -> bool {
        self.modal(id) == ModalState::Open
    }

    pub fn open_modals(&self) -> impl Iterator<Item = &ModalId> {
        self.modals
            .iter()
            .filter(|(_, state)| **state == ModalState::Open)
            .map(|(id, _)| id)
    }

    /// Close every open modal (click on the modal backdrop).
    pub fn dismiss_all(&mut self) {
        for state in self.modals.values_mut() {
            *state = ModalState::Closed;
        }
    }

    /// Drop notifications that have been visible for their full duration.
    pub fn expire(&mut self, now: Instant) {
        self.notifications
            .retain(|n| now.saturating_duration_since(n.shown_at) < NOTIFICATION_DISPLAY);
    }

    #[must_use]
    pub fn nav_links(&self) -> Vec<NavLink> {
        nav_links(&self.nav)
    }
}

/// Apply every event from `rx` to `view` until the bus closes, expiring
/// notifications as they reach the end of their display time.
///
/// A lagging receiver skips the overwritten events and keeps going; the next
/// navigation event brings the view back in line.
pub fn spawn_view(mut rx: broadcast::Receiver<SessionEvent>, view: Arc<Mutex<ViewState>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sweep = tokio::time::interval(EXPIRY_SWEEP);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                recv = rx.recv() => match recv {
                    Ok(event) => {
                        let now = clock_now();
                        let mut view = view.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                        view.expire(now);
                        view.apply_at(&event, now);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "view renderer lagged behind session events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = sweep.tick() => {
                    view.lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .expire(clock_now());
                }
            }
        }
    })
}

/// Runtime clock, so a paused test runtime controls expiry too.
fn clock_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
