//! Presentation-facing side of the session core.
//!
//! SYSTEM CONTEXT
//! ==============
//! `events` is the contract between the session core and renderers, `nav`
//! maps session state to navigation links, and `view` is the reference
//! renderer state that consumes the event stream.

pub mod events;
pub mod nav;
pub mod view;

pub use events::{EventBus, ModalId, NavView, Notification, SessionEvent, Severity};
pub use view::{ModalState, ViewState, spawn_view};
