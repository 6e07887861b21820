//! Gmail API v1: watch registration, history diff, message and attachment fetch.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ensure_success, GoogleApiError, GoogleAuth};
use crate::models::mail::{deserialize_history_id, Message, MessageRef};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Mailbox operations the notification pipeline and the watch renewal need.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Registers (or renews) push notifications for INBOX on `topic_name`.
    async fn watch(&self, topic_name: &str) -> Result<WatchResponse, GoogleApiError>;

    /// All distinct messages added since `start_history_id`, in first-seen order.
    async fn list_added_messages(
        &self,
        start_history_id: &str,
    ) -> Result<Vec<MessageRef>, GoogleApiError>;

    async fn get_message(&self, message_id: &str) -> Result<Message, GoogleApiError>;

    /// Base64 attachment data, or `None` when the provider returned no data.
    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Option<String>, GoogleApiError>;
}

// ============================================================================
// API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchRequest<'a> {
    label_ids: Vec<&'a str>,
    topic_name: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchResponse {
    #[serde(deserialize_with = "deserialize_history_id")]
    pub history_id: String,
    /// Epoch milliseconds, as a string.
    #[serde(default)]
    pub expiration: Option<String>,
}

impl WatchResponse {
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        let millis = self.expiration.as_deref()?.parse::<i64>().ok()?;
        DateTime::from_timestamp_millis(millis)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryListResponse {
    #[serde(default)]
    history: Vec<HistoryRecord>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRecord {
    #[serde(default)]
    messages_added: Vec<MessageAdded>,
}

#[derive(Debug, Deserialize)]
struct MessageAdded {
    message: MessageRef,
}

#[derive(Debug, Deserialize)]
struct AttachmentResponse {
    #[serde(default)]
    data: Option<String>,
}

/// Follows `nextPageToken` until the last page, concatenating history records.
/// `fetch_page` receives `None` for the first page.
async fn collect_history_pages<F, Fut>(
    mut fetch_page: F,
) -> Result<Vec<HistoryRecord>, GoogleApiError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<HistoryListResponse, GoogleApiError>>,
{
    let mut records = Vec::new();
    let mut page_token = None;

    loop {
        let page = fetch_page(page_token.take()).await?;
        records.extend(page.history);
        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(next) => {
                debug!("Fetching next history page");
                page_token = Some(next);
            }
            None => return Ok(records),
        }
    }
}

/// A message may show up in several history records; keep the first sighting.
fn dedup_added_messages(records: &[HistoryRecord]) -> Vec<MessageRef> {
    let mut seen = HashSet::new();
    records
        .iter()
        .flat_map(|record| record.messages_added.iter())
        .filter(|added| seen.insert(added.message.id.clone()))
        .map(|added| added.message.clone())
        .collect()
}

// ============================================================================
// Client
// ============================================================================

pub struct GmailClient {
    http: Client,
    auth: Arc<GoogleAuth>,
}

impl GmailClient {
    pub fn new(auth: Arc<GoogleAuth>) -> Self {
        Self {
            http: Client::new(),
            auth,
        }
    }

    async fn fetch_history_page(
        &self,
        token: &str,
        start_history_id: &str,
        page_token: Option<String>,
    ) -> Result<HistoryListResponse, GoogleApiError> {
        let mut query = vec![
            ("startHistoryId", start_history_id.to_string()),
            ("historyTypes", "messageAdded".to_string()),
        ];
        if let Some(page) = page_token {
            query.push(("pageToken", page));
        }

        let resp = self
            .http
            .get(format!("{GMAIL_API_BASE}/history"))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn watch(&self, topic_name: &str) -> Result<WatchResponse, GoogleApiError> {
        let token = self.auth.access_token().await?;
        info!("Setting up Gmail watch for topic: {topic_name}");

        let resp = self
            .http
            .post(format!("{GMAIL_API_BASE}/watch"))
            .bearer_auth(&token)
            .json(&WatchRequest {
                label_ids: vec!["INBOX"],
                topic_name,
            })
            .send()
            .await?;

        let watch: WatchResponse = ensure_success(resp).await?.json().await?;
        info!(
            "Gmail watch registered: history id {}, expiration {:?}",
            watch.history_id, watch.expiration
        );
        Ok(watch)
    }

    async fn list_added_messages(
        &self,
        start_history_id: &str,
    ) -> Result<Vec<MessageRef>, GoogleApiError> {
        let token = self.auth.access_token().await?;
        info!("Fetching history starting from ID: {start_history_id}");

        let records = collect_history_pages(|page_token| {
            self.fetch_history_page(&token, start_history_id, page_token)
        })
        .await?;

        let messages = dedup_added_messages(&records);
        if messages.is_empty() {
            info!("No new message history found since {start_history_id}");
        } else {
            info!("Found {} new message(s) in history", messages.len());
        }
        Ok(messages)
    }

    async fn get_message(&self, message_id: &str) -> Result<Message, GoogleApiError> {
        let token = self.auth.access_token().await?;
        debug!("Fetching full details for message ID: {message_id}");

        let resp = self
            .http
            .get(format!("{GMAIL_API_BASE}/messages/{message_id}"))
            .bearer_auth(&token)
            .query(&[("format", "full")])
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }

    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Option<String>, GoogleApiError> {
        let token = self.auth.access_token().await?;

        let resp = self
            .http
            .get(format!(
                "{GMAIL_API_BASE}/messages/{message_id}/attachments/{attachment_id}"
            ))
            .bearer_auth(&token)
            .send()
            .await?;
        let attachment: AttachmentResponse = ensure_success(resp).await?.json().await?;
        Ok(attachment.data.filter(|d| !d.is_empty()))
    }
}
