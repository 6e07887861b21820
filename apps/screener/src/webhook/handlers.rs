use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::webhook::payload::decode_push;

#[derive(Deserialize)]
pub struct WebhookQuery {
    pub token: Option<String>,
}

/// POST /webhook
/// Acknowledges a valid push with 204 and processes it in the background.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if let Some(secret) = state.config.webhook_secret.as_deref() {
        if query.token.as_deref() != Some(secret) {
            warn!("Rejected webhook call with missing or invalid token");
            return Err(AppError::Forbidden);
        }
    }

    let (notification, message_id) = decode_push(&body).map_err(|e| {
        warn!("{e}");
        AppError::Validation(e.to_string())
    })?;
    info!(
        "Received notification {} for {}, history id {}",
        message_id.as_deref().unwrap_or("N/A"),
        notification.email_address,
        notification.history_id
    );

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        if let Err(e) = pipeline.process_notification(&notification).await {
            error!(
                "Error processing notification for history id {}: {e:#}",
                notification.history_id
            );
        }
    });

    Ok(StatusCode::NO_CONTENT)
}
