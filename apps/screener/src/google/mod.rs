//! Narrow REST clients for the Google APIs the screener talks to.
//!
//! - oauth: consent URL, code exchange, access-token minting, revocation
//! - gmail: watch registration, history diff, message and attachment fetch
//! - calendar: Meet-enabled event insertion

pub mod calendar;
pub mod gmail;
pub mod oauth;

use serde::Deserialize;

pub use calendar::{GoogleCalendar, MeetingScheduler, ScheduledMeeting};
pub use gmail::{GmailClient, Mailbox, WatchResponse};
pub use oauth::GoogleAuth;

#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Application not authenticated. Refresh token missing.")]
    NotAuthenticated,
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Storage: {0}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    /// `{"error": {"code": 404, "message": "..."}}` from the REST APIs.
    Api { error: ApiErrorDetail },
    /// `{"error": "invalid_grant", "error_description": "..."}` from the token endpoint.
    OAuth {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Api { error }) if !error.message.is_empty() => error.message,
        Ok(ErrorBody::OAuth {
            error,
            error_description,
        }) => match error_description {
            Some(desc) => format!("{error}: {desc}"),
            None => error,
        },
        _ => body.to_string(),
    }
}

/// Passes successful responses through; turns anything else into `GoogleApiError::Api`.
async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, GoogleApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GoogleApiError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_api_error() {
        let body = r#"{"error": {"code": 404, "message": "Resource not found: topic", "status": "NOT_FOUND"}}"#;
        assert_eq!(error_message(body), "Resource not found: topic");
    }

    #[test]
    fn test_error_message_from_oauth_error() {
        let body = r#"{"error": "invalid_grant", "error_description": "Bad Request"}"#;
        assert_eq!(error_message(body), "invalid_grant: Bad Request");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("upstream timeout"), "upstream timeout");
    }
}
