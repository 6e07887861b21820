use chrono::{DateTime, Utc};
use tracing::info;

use crate::google::{GoogleApiError, Mailbox, WatchResponse};
use crate::storage::CursorStore;

/// Registers the INBOX watch and records the returned history id and expiry.
pub async fn setup_watch(
    mailbox: &dyn Mailbox,
    cursor: &CursorStore,
    topic_name: &str,
) -> Result<WatchResponse, GoogleApiError> {
    info!("Setting up Gmail watch on {topic_name}");
    let response = mailbox.watch(topic_name).await?;
    let expiry: Option<DateTime<Utc>> = response.expiry();
    info!(
        "Watch active: history id {}, expires {}",
        response.history_id,
        expiry.map(|e| e.to_rfc3339()).unwrap_or_else(|| "N/A".into())
    );
    cursor.save_watch_state(&response.history_id, expiry).await?;
    Ok(response)
}
