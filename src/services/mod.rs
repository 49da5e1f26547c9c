//! Domain services driven by user actions and page startup.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the session transitions so renderers and page scripts
//! stay focused on presentation and on calling the exported surface.

pub mod session;
