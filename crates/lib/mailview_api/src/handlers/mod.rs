//! Request handlers.

pub mod accounts;
pub mod audit;
pub mod auth;
pub mod mailbox;
