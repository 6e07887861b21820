use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::screening::criteria::ScreeningRole;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    pub google_project_id: String,
    pub pubsub_topic_id: String,
    pub gemini_api_key: String,
    pub port: u16,
    pub webhook_secret: Option<String>,
    pub token_path: PathBuf,
    pub state_path: PathBuf,
    pub candidates_path: PathBuf,
    pub attachments_dir: PathBuf,
    /// Where the browser lands after a successful OAuth callback.
    pub frontend_url: String,
    pub screening_role: ScreeningRole,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            google_client_id: require_env("GOOGLE_CLIENT_ID")?,
            google_client_secret: require_env("GOOGLE_CLIENT_SECRET")?,
            google_redirect_uri: require_env("GOOGLE_REDIRECT_URI")?,
            google_project_id: require_env("GOOGLE_PROJECT_ID")?,
            pubsub_topic_id: require_env("PUB_SUB_TOPIC_ID")?,
            gemini_api_key: require_env("GOOGLE_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            webhook_secret: optional_env("WEBHOOK_SECRET_TOKEN"),
            token_path: path_env("TOKEN_STORAGE_PATH", "storage/token.json"),
            state_path: path_env("STATE_STORAGE_PATH", "storage/state.json"),
            candidates_path: path_env("CANDIDATES_STORAGE_PATH", "storage/candidates.json"),
            attachments_dir: path_env("ATTACHMENTS_DIR", "attachments"),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173/".to_string()),
            screening_role: std::env::var("SCREENING_ROLE")
                .unwrap_or_else(|_| "junior".to_string())
                .parse::<ScreeningRole>()
                .map_err(|e| anyhow!("SCREENING_ROLE must be 'junior' or 'senior': {e}"))?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Fully-qualified Pub/Sub topic the mailbox watch publishes to.
    pub fn topic_name(&self) -> String {
        format!(
            "projects/{}/topics/{}",
            self.google_project_id, self.pubsub_topic_id
        )
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn path_env(key: &str, default: &str) -> PathBuf {
    optional_env(key)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

#[cfg(test)]
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    Config {
        google_client_id: "client-id".to_string(),
        google_client_secret: "client-secret".to_string(),
        google_redirect_uri: "http://localhost:3000/oauth2callback".to_string(),
        google_project_id: "hiring-project".to_string(),
        pubsub_topic_id: "gmail-notifications".to_string(),
        gemini_api_key: "gemini-key".to_string(),
        port: 3000,
        webhook_secret: None,
        token_path: dir.join("token.json"),
        state_path: dir.join("state.json"),
        candidates_path: dir.join("candidates.json"),
        attachments_dir: dir.join("attachments"),
        frontend_url: "http://localhost:5173/".to_string(),
        screening_role: ScreeningRole::Junior,
        rust_log: "debug".to_string(),
    }
}
