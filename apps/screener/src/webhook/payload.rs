//! Push envelope decoding.
//!
//! Pub/Sub wraps the Gmail notification as base64 JSON in `message.data`:
//! `{"emailAddress": "...", "historyId": 12345}`.

use serde::Deserialize;
use thiserror::Error;

use crate::models::mail::deserialize_optional_history_id;
use crate::screening::attachment::decode_base64;
use crate::screening::pipeline::Notification;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Invalid Pub/Sub message format: {0}")]
    Envelope(serde_json::Error),
    #[error("Invalid Pub/Sub message format: missing message.data")]
    MissingData,
    #[error("Invalid Pub/Sub message data: not base64")]
    Base64(#[from] base64::DecodeError),
    #[error("Invalid Pub/Sub message data: {0}")]
    Data(serde_json::Error),
    #[error("Invalid Pub/Sub message data: missing emailAddress")]
    MissingEmail,
    #[error("Invalid Pub/Sub message data: missing historyId")]
    MissingHistoryId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushEnvelope {
    #[serde(default)]
    message: Option<PushMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushMessage {
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationData {
    #[serde(default)]
    email_address: String,
    #[serde(default, deserialize_with = "deserialize_optional_history_id")]
    history_id: Option<String>,
}

/// Decodes a raw push request body into a notification.
pub fn decode_push(body: &[u8]) -> Result<(Notification, Option<String>), PayloadError> {
    let envelope: PushEnvelope = serde_json::from_slice(body).map_err(PayloadError::Envelope)?;
    let message = envelope.message.ok_or(PayloadError::MissingData)?;
    let data = message
        .data
        .filter(|d| !d.is_empty())
        .ok_or(PayloadError::MissingData)?;

    let decoded = decode_base64(&data)?;
    let data: NotificationData = serde_json::from_slice(&decoded).map_err(PayloadError::Data)?;

    if data.email_address.trim().is_empty() {
        return Err(PayloadError::MissingEmail);
    }
    let history_id = data
        .history_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(PayloadError::MissingHistoryId)?;

    Ok((
        Notification {
            email_address: data.email_address,
            history_id,
        },
        message.message_id,
    ))
}

#[cfg(test)]
pub(crate) fn push_body(data_json: &str) -> Vec<u8> {
    use base64::Engine;
    let data = base64::engine::general_purpose::STANDARD.encode(data_json);
    serde_json::json!({
        "message": { "data": data, "messageId": "pubsub-1", "publishTime": "2024-05-01T10:00:00Z" },
        "subscription": "projects/p/subscriptions/s"
    })
    .to_string()
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_history_id() {
        let (n, id) =
            decode_push(&push_body(r#"{"emailAddress":"hr@corp.com","historyId":12345}"#))
                .unwrap();
        assert_eq!(n.email_address, "hr@corp.com");
        assert_eq!(n.history_id, "12345");
        assert_eq!(id.as_deref(), Some("pubsub-1"));
    }

    #[test]
    fn test_string_history_id() {
        let (n, _) =
            decode_push(&push_body(r#"{"emailAddress":"hr@corp.com","historyId":"987"}"#))
                .unwrap();
        assert_eq!(n.history_id, "987");
    }

    #[test]
    fn test_missing_message_data() {
        assert!(matches!(
            decode_push(br#"{"message":{}}"#),
            Err(PayloadError::MissingData)
        ));
        assert!(matches!(decode_push(b"{}"), Err(PayloadError::MissingData)));
    }

    #[test]
    fn test_not_json_envelope() {
        assert!(matches!(
            decode_push(b"not json"),
            Err(PayloadError::Envelope(_))
        ));
    }

    #[test]
    fn test_bad_base64() {
        assert!(matches!(
            decode_push(br#"{"message":{"data":"@@@@"}}"#),
            Err(PayloadError::Base64(_))
        ));
    }

    #[test]
    fn test_missing_fields_in_data() {
        assert!(matches!(
            decode_push(&push_body(r#"{"historyId":"1"}"#)),
            Err(PayloadError::MissingEmail)
        ));
        assert!(matches!(
            decode_push(&push_body(r#"{"emailAddress":"hr@corp.com"}"#)),
            Err(PayloadError::MissingHistoryId)
        ));
        assert!(matches!(
            decode_push(&push_body(r#"{"emailAddress":"hr@corp.com","historyId":null}"#)),
            Err(PayloadError::MissingHistoryId)
        ));
        assert!(matches!(
            decode_push(&push_body(r#"{"emailAddress":"hr@corp.com","historyId":""}"#)),
            Err(PayloadError::MissingHistoryId)
        ));
    }

    #[test]
    fn test_wrongly_typed_data_is_a_data_error() {
        assert!(matches!(
            decode_push(&push_body(r#"{"emailAddress":"hr@corp.com","historyId":true}"#)),
            Err(PayloadError::Data(_))
        ));
        assert!(matches!(
            decode_push(&push_body("[1,2]")),
            Err(PayloadError::Data(_))
        ));
    }
}
