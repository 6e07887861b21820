//! File-backed JSON stores.
//!
//! Every store keeps its whole state in one small JSON file. Reads treat a
//! missing or unreadable file as empty state; writes go to a sibling temp
//! file that is renamed over the target.

pub mod candidates;
pub mod cursor;
pub mod token;

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

pub use candidates::CandidateStore;
pub use cursor::CursorStore;
pub use token::TokenStore;

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match tokio::fs::read(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} not found, using empty state", path.display());
            return T::default();
        }
        Err(e) => {
            warn!("Failed to read {}: {e}. Using empty state", path.display());
            return T::default();
        }
    };

    serde_json::from_slice(&content).unwrap_or_else(|e| {
        warn!("{} is not valid JSON ({e}). Using empty state", path.display());
        T::default()
    })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let data = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, data)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Deletes a store file. Returns `false` when the file was already absent.
async fn remove_file(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!("{} deleted", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{} not found, likely already deleted", path.display());
            Ok(false)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
    }
}
