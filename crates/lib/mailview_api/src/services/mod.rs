//! Request-facing services sitting between handlers and `mailview_core`.

pub mod auth;
pub mod mailbox;
