use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{read_json, remove_file, write_json};
use crate::models::mail::deserialize_optional_history_id;

/// Mailbox sync position plus the current watch subscription expiry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorState {
    /// Older state files hold the id as a JSON number.
    #[serde(default, deserialize_with = "deserialize_optional_history_id")]
    pub last_history_id: Option<String>,
    #[serde(default)]
    pub watch_expiry: Option<DateTime<Utc>>,
}

/// Single-writer store for [`CursorState`].
pub struct CursorStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CursorStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> CursorState {
        read_json(&self.path).await
    }

    pub async fn last_history_id(&self) -> Option<String> {
        self.load().await.last_history_id
    }

    pub async fn watch_expiry(&self) -> Option<DateTime<Utc>> {
        self.load().await.watch_expiry
    }

    /// Moves the cursor to `history_id` unless that would move it backwards.
    /// Returns the id stored after the call.
    pub async fn advance_history_id(&self, history_id: &str) -> Result<String> {
        let _guard = self.write_lock.lock().await;
        let mut state: CursorState = read_json(&self.path).await;

        if !is_forward(state.last_history_id.as_deref(), history_id) {
            warn!(
                "Ignoring history id {history_id}: cursor already at {}",
                state.last_history_id.as_deref().unwrap_or_default()
            );
            return Ok(state.last_history_id.unwrap_or_default());
        }

        state.last_history_id = Some(history_id.to_string());
        write_json(&self.path, &state).await?;
        info!("Cursor advanced to history id {history_id}");
        Ok(history_id.to_string())
    }

    /// Records a fresh watch registration.
    pub async fn save_watch_state(
        &self,
        history_id: &str,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut state: CursorState = read_json(&self.path).await;

        if is_forward(state.last_history_id.as_deref(), history_id) {
            state.last_history_id = Some(history_id.to_string());
        }
        state.watch_expiry = expiry;
        write_json(&self.path, &state).await?;
        info!(
            "Watch state saved: history id {}, expiry {}",
            state.last_history_id.as_deref().unwrap_or("N/A"),
            expiry.map(|e| e.to_rfc3339()).unwrap_or_else(|| "N/A".into())
        );
        Ok(())
    }

    pub async fn clear(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        remove_file(&self.path).await
    }
}

/// History ids are opaque, but Gmail issues them as increasing integers.
/// Numeric ids never regress; anything else is taken as-is.
fn is_forward(current: Option<&str>, candidate: &str) -> bool {
    let Some(current) = current else {
        return true;
    };
    match (current.parse::<u128>(), candidate.parse::<u128>()) {
        (Ok(cur), Ok(next)) => next >= cur,
        _ => true,
    }
}
