mod auth;
mod config;
mod errors;
mod google;
mod jobs;
mod llm_client;
mod models;
mod routes;
mod screening;
mod state;
mod storage;
#[cfg(test)]
mod testing;
mod webhook;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::google::{GmailClient, GoogleAuth, GoogleCalendar};
use crate::jobs::watch_renewal::WatchRenewal;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::classifier::LlmClassifier;
use crate::screening::pipeline::Pipeline;
use crate::state::AppState;
use crate::storage::{CandidateStore, CursorStore, TokenStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    // File-backed stores
    let tokens = Arc::new(TokenStore::new(config.token_path.clone()));
    let cursor = Arc::new(CursorStore::new(config.state_path.clone()));
    let candidates = Arc::new(CandidateStore::open(config.candidates_path.clone()).await);
    tokio::fs::create_dir_all(&config.attachments_dir).await?;

    // Google clients
    let auth = Arc::new(GoogleAuth::new(&config, tokens.clone()));
    let mailbox = Arc::new(GmailClient::new(auth.clone()));
    let scheduler = Arc::new(GoogleCalendar::new(auth.clone()));

    // Initialize LLM classifier
    let llm = LlmClient::new(config.gemini_api_key.clone())?;
    info!(
        "LLM client initialized (model: {}, rubric: {:?})",
        llm_client::MODEL,
        config.screening_role
    );
    let classifier = Arc::new(LlmClassifier::new(llm, config.screening_role));

    let pipeline = Arc::new(Pipeline::new(
        cursor.clone(),
        mailbox.clone(),
        classifier,
        scheduler,
        candidates.clone(),
        config.attachments_dir.clone(),
    ));

    WatchRenewal {
        auth: auth.clone(),
        mailbox: mailbox.clone(),
        cursor: cursor.clone(),
        topic_name: config.topic_name(),
    }
    .spawn();

    // Build app state
    let state = AppState {
        config: config.clone(),
        auth,
        tokens,
        cursor,
        candidates,
        mailbox,
        pipeline,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
