//! OAuth2 web-server flow against Google's identity endpoints.
//!
//! The refresh token is the only credential persisted. Access tokens are
//! minted from it on demand and cached in memory until shortly before expiry.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{ensure_success, GoogleApiError};
use crate::config::Config;
use crate::storage::TokenStore;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Scopes requested at consent time.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/pubsub",
    "https://www.googleapis.com/auth/calendar.events",
];

/// Refresh this long before the provider-reported expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn from_response(resp: &TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            token: resp.access_token.clone(),
            expires_at: now + Duration::seconds(resp.expires_in.unwrap_or(3600)),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_SKEW_SECS) > now
    }
}

pub struct GoogleAuth {
    http: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    tokens: Arc<TokenStore>,
    cached: Mutex<Option<AccessToken>>,
}

impl GoogleAuth {
    pub fn new(config: &Config, tokens: Arc<TokenStore>) -> Self {
        Self {
            http: Client::new(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
            tokens,
            cached: Mutex::new(None),
        }
    }

    /// Consent URL requesting offline access so a refresh token is issued.
    pub fn authorization_url(&self) -> Result<String, url::ParseError> {
        let scope = SCOPES.join(" ");
        let url = Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )?;
        Ok(url.into())
    }

    /// Exchanges an authorization code and persists the refresh token.
    pub async fn exchange_code(&self, code: &str) -> Result<(), GoogleApiError> {
        info!("Exchanging authorization code for tokens");
        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let tokens: TokenResponse = match ensure_success(resp).await {
            Ok(r) => r.json().await?,
            Err(GoogleApiError::Api { message, .. }) => {
                error!("Error exchanging code for tokens: {message}");
                return Err(GoogleApiError::TokenExchange(message));
            }
            Err(e) => return Err(e),
        };

        match tokens.refresh_token.as_deref() {
            Some(refresh) => self.tokens.save_refresh_token(refresh).await?,
            None => warn!("Refresh token not returned in this exchange"),
        }

        *self.cached.lock().await = Some(AccessToken::from_response(&tokens, Utc::now()));
        info!("Tokens acquired");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated().await
    }

    /// Returns a usable access token, minting a new one from the stored refresh token if needed.
    pub async fn access_token(&self) -> Result<String, GoogleApiError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.token.clone());
        }

        let refresh_token = self.tokens.refresh_token().await.ok_or_else(|| {
            warn!("No refresh token found in storage");
            GoogleApiError::NotAuthenticated
        })?;

        debug!("Minting access token from refresh token");
        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        let tokens: TokenResponse = ensure_success(resp).await?.json().await?;

        let token = AccessToken::from_response(&tokens, Utc::now());
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Revokes the stored refresh token. Failures are logged, never returned.
    pub async fn revoke(&self) {
        self.cached.lock().await.take();

        let Some(refresh_token) = self.tokens.refresh_token().await else {
            warn!("No refresh token found to revoke");
            return;
        };

        info!("Revoking Google token");
        let result = self
            .http
            .post(REVOKE_URL)
            .form(&[("token", refresh_token.as_str())])
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => info!("Google token revoked"),
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                warn!("Token revocation might have failed. Status: {status}, body: {body}");
            }
            Err(e) => error!("Error revoking Google token: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_authorization_url_requests_offline_consent() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let auth = GoogleAuth::new(&config, Arc::new(TokenStore::new(config.token_path.clone())));

        let url = Url::parse(&auth.authorization_url().unwrap()).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["prompt"], "consent");
        assert_eq!(params["response_type"], "code");
        assert!(params["scope"].contains("gmail.readonly"));
        assert!(params["scope"].contains("calendar.events"));
    }

    #[test]
    fn test_access_token_freshness_uses_skew() {
        let now = Utc::now();
        let resp = TokenResponse {
            access_token: "ya29.a".to_string(),
            expires_in: Some(3599),
            refresh_token: None,
        };
        let token = AccessToken::from_response(&resp, now);
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(3599 - 30)));
    }

    #[test]
    fn test_token_response_without_refresh_token() {
        let json = r#"{"access_token": "ya29.b", "expires_in": 3599, "token_type": "Bearer"}"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert!(resp.refresh_token.is_none());
        assert_eq!(resp.expires_in, Some(3599));
    }

    #[tokio::test]
    async fn test_access_token_requires_stored_credential() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let auth = GoogleAuth::new(&config, Arc::new(TokenStore::new(config.token_path.clone())));

        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, GoogleApiError::NotAuthenticated));
    }
}
