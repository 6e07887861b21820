//! Pub/Sub push endpoint for mailbox change notifications.

pub mod handlers;
pub mod payload;
