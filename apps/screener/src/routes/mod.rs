pub mod candidates;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::state::AppState;
use crate::webhook::handlers::handle_webhook;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(auth::handle_status))
        .route("/auth", get(auth::handle_auth))
        .route("/oauth2callback", get(auth::handle_oauth_callback))
        .route("/logout", get(auth::handle_logout))
        .route("/getCandidates", get(candidates::handle_get_candidates))
        .route("/webhook", post(handle_webhook))
        .with_state(state)
}
