use std::sync::Arc;

use crate::config::Config;
use crate::google::{GoogleAuth, Mailbox};
use crate::screening::pipeline::Pipeline;
use crate::storage::{CandidateStore, CursorStore, TokenStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: Arc<GoogleAuth>,
    pub tokens: Arc<TokenStore>,
    pub cursor: Arc<CursorStore>,
    pub candidates: Arc<CandidateStore>,
    /// Pluggable mailbox. Default: `GmailClient`; tests use an in-memory fake.
    pub mailbox: Arc<dyn Mailbox>,
    pub pipeline: Arc<Pipeline>,
}
