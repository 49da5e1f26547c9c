//! Navigation bar model for guests and signed-in members.

use super::events::{ModalId, NavView};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavAction {
    Href(String),
    OpenModal(ModalId),
    Logout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub action: NavAction,
    /// Rendered as a button rather than a plain link.
    pub emphasized: bool,
}

impl NavLink {
    fn href(label: &'static str, href: impl Into<String>) -> Self {
        Self { label, action: NavAction::Href(href.into()), emphasized: false }
    }

    fn emphasized(mut self) -> Self {
        self.emphasized = true;
        self
    }
}

/// Links shown in the navigation bar for `view`, in display order.
#[must_use]
pub fn nav_links(view: &NavView) -> Vec<NavLink> {
    let mut links = vec![
        NavLink::href("Home", "/"),
        NavLink::href("Posts", "/posts"),
        NavLink::href("Authors", "/users"),
    ];
    match view {
        NavView::Guest => {
            links.push(NavLink {
                label: "Log in",
                action: NavAction::OpenModal(ModalId::login()),
                emphasized: false,
            });
            links.push(NavLink {
                label: "Sign up",
                action: NavAction::OpenModal(ModalId::register()),
                emphasized: true,
            });
        }
        NavView::Member { user_id, .. } => {
            links.push(NavLink::href("Bookmarks", "/bookmarks"));
            links.push(NavLink::href("Write post", "/create-post").emphasized());
            links.push(NavLink::href("Profile", format!("/profile/{user_id}")));
            links.push(NavLink { label: "Log out", action: NavAction::Logout, emphasized: false });
        }
    }
    links
}

#[cfg(test)]
#[path = "nav_test.rs"]
mod tests;
