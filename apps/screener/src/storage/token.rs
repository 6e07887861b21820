use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use super::{read_json, remove_file, write_json};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredCredential {
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Holds the long-lived OAuth refresh token.
pub struct TokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn refresh_token(&self) -> Option<String> {
        let stored: StoredCredential = read_json(&self.path).await;
        stored.refresh_token.filter(|t| !t.is_empty())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.refresh_token().await.is_some()
    }

    pub async fn save_refresh_token(&self, token: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        write_json(
            &self.path,
            &StoredCredential {
                refresh_token: Some(token.to_string()),
            },
        )
        .await?;
        info!("Refresh token saved to {}", self.path.display());
        Ok(())
    }

    pub async fn clear(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        remove_file(&self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unauthenticated_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_save_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let store = TokenStore::new(path.clone());

        store.save_refresh_token("1//refresh").await.unwrap();
        assert_eq!(store.refresh_token().await.as_deref(), Some("1//refresh"));

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.contains("\"refresh_token\""));

        assert!(store.clear().await.unwrap());
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_empty_token_counts_as_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        tokio::fs::write(&path, br#"{"refresh_token": ""}"#)
            .await
            .unwrap();
        let store = TokenStore::new(path);
        assert!(!store.is_authenticated().await);
    }
}
