use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::screening::watch::setup_watch;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WatchStatus {
    Active,
    Expired,
    Inactive,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub authenticated: bool,
    pub watch_status: WatchStatus,
    pub expiry_info: String,
    pub history_id: String,
}

/// GET /auth
pub async fn handle_auth(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let url = state
        .auth
        .authorization_url()
        .map_err(|e| AppError::Internal(e.into()))?;
    info!("Redirecting to Google consent screen");
    Ok(Redirect::temporary(&url))
}

/// GET /oauth2callback
/// Exchanges the code, registers the mailbox watch, then returns to the frontend.
pub async fn handle_oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        if let Some(err) = query.error {
            warn!("OAuth consent returned error: {err}");
        }
        return Err(AppError::Validation(
            "Authorization code missing".to_string(),
        ));
    };

    state
        .auth
        .exchange_code(&code)
        .await
        .map_err(|e| AppError::AuthFailed(e.to_string()))?;

    setup_watch(
        state.mailbox.as_ref(),
        &state.cursor,
        &state.config.topic_name(),
    )
    .await
    .map_err(|e| AppError::AuthFailed(format!("watch setup failed: {e}")))?;

    info!("Authentication successful, watch registered");
    Ok(Redirect::to(&state.config.frontend_url))
}

/// GET /logout
/// Revokes the grant and forgets the local credential and cursor.
pub async fn handle_logout(State(state): State<AppState>) -> Json<Value> {
    state.auth.revoke().await;

    match state.tokens.clear().await {
        Ok(_) => info!("Local credentials cleared"),
        Err(e) => error!("Failed to clear local credentials: {e:#}"),
    }
    match state.cursor.clear().await {
        Ok(_) => info!("Local watch state cleared"),
        Err(e) => error!("Failed to clear local watch state: {e:#}"),
    }

    Json(json!({ "message": "Logout successful" }))
}

/// GET /
pub async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let authenticated = state.auth.is_authenticated().await;
    let mut response = StatusResponse {
        authenticated,
        watch_status: WatchStatus::Inactive,
        expiry_info: "N/A".to_string(),
        history_id: "N/A".to_string(),
    };
    if !authenticated {
        return Json(response);
    }

    let cursor = state.cursor.load().await;
    if let Some(history_id) = cursor.last_history_id {
        response.history_id = history_id;
    }
    if let Some(expiry) = cursor.watch_expiry {
        response.watch_status = if expiry > Utc::now() {
            WatchStatus::Active
        } else {
            WatchStatus::Expired
        };
        response.expiry_info = expiry.to_rfc3339();
    }
    Json(response)
}
