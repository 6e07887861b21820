//! Attachment locator.
//!
//! Walks a message's MIME tree in pre-order and saves the first attachment
//! whose bytes can be obtained, decoded and written. A candidate that fails
//! does not stop the walk; its children and later siblings are still tried.
//! At most one attachment is saved per message.

use std::path::{Path, PathBuf};

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::google::{GoogleApiError, Mailbox};
use crate::models::mail::{AttachmentSource, MessagePart};

/// Extensions the classifier accepts.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".doc", ".txt"];

/// Standard alphabet, padding optional. URL-safe input is mapped onto it first.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAttachment {
    /// `<messageId>-<sanitized filename>`
    pub file_name: String,
    pub path: PathBuf,
}

impl SavedAttachment {
    /// Lower-cased extension including the dot, e.g. `.pdf`.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
    }

    pub fn has_allowed_extension(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
    }
}

#[derive(Debug, Error)]
enum AttachmentError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] GoogleApiError),
    #[error("provider returned no attachment data")]
    NoData,
    #[error("invalid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Decodes standard or URL-safe base64, with or without padding.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let normalized: String = data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    LENIENT_BASE64.decode(normalized)
}

/// Saves the first usable attachment under `dir`. `None` when nothing qualified.
pub async fn find_and_save_attachment(
    mailbox: &dyn Mailbox,
    message_id: &str,
    root: &MessagePart,
    dir: &Path,
) -> Option<SavedAttachment> {
    let mut stack = vec![(root, 0usize)];

    while let Some((part, depth)) = stack.pop() {
        let indent = "  ".repeat(depth);
        debug!(
            "{indent}Checking part {} ({}), filename: {}",
            part.part_id.as_deref().unwrap_or("N/A"),
            part.mime_type.as_deref().unwrap_or("unknown"),
            if part.filename.is_empty() { "N/A" } else { part.filename.as_str() }
        );

        if part.is_attachment_candidate() {
            info!("{indent}Found attachment candidate: {}", part.filename);
            match save_part(mailbox, message_id, part, dir).await {
                Ok(saved) => {
                    info!("{indent}Saved attachment to {}", saved.path.display());
                    return Some(saved);
                }
                Err(e) => warn!("{indent}Could not save attachment \"{}\": {e}", part.filename),
            }
        }

        // Reverse so the first child is popped next.
        stack.extend(part.parts.iter().rev().map(|child| (child, depth + 1)));
    }

    debug!("No attachment saved for message {message_id}");
    None
}

async fn save_part(
    mailbox: &dyn Mailbox,
    message_id: &str,
    part: &MessagePart,
    dir: &Path,
) -> Result<SavedAttachment, AttachmentError> {
    let encoded = match part.attachment_source() {
        Some(AttachmentSource::Inline(data)) => data.to_string(),
        Some(AttachmentSource::Remote(attachment_id)) => {
            debug!("Fetching attachment data via ID: {attachment_id}");
            mailbox
                .get_attachment(message_id, attachment_id)
                .await?
                .ok_or(AttachmentError::NoData)?
        }
        None => return Err(AttachmentError::NoData),
    };

    let bytes = decode_base64(&encoded)?;
    let file_name = format!("{message_id}-{}", sanitize_filename(&part.filename));
    let path = dir.join(&file_name);

    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, &bytes).await?;

    Ok(SavedAttachment { file_name, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mail::PartBody;
    use crate::testing::FakeMailbox;

    fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    fn container(children: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            mime_type: Some("multipart/mixed".to_string()),
            parts: children,
            ..Default::default()
        }
    }

    fn inline(filename: &str, data: &str) -> MessagePart {
        MessagePart {
            filename: filename.to_string(),
            body: Some(PartBody {
                data: Some(data.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn remote(filename: &str, attachment_id: &str) -> MessagePart {
        MessagePart {
            filename: filename.to_string(),
            body: Some(PartBody {
                attachment_id: Some(attachment_id.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Resume (v2).pdf"), "My_Resume__v2_.pdf");
        assert_eq!(sanitize_filename("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_filename("cv_final-2.docx"), "cv_final-2.docx");
        assert_eq!(sanitize_filename("résumé.pdf"), "r_sum_.pdf");
    }

    #[test]
    fn test_decode_accepts_both_alphabets() {
        let bytes = [0xfb, 0xff, 0xfe, 0x00, 0x41];
        let standard = base64::engine::general_purpose::STANDARD.encode(bytes);
        let url_safe = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        assert_ne!(standard, url_safe);
        assert_eq!(decode_base64(&standard).unwrap(), bytes);
        assert_eq!(decode_base64(&url_safe).unwrap(), bytes);
    }

    #[test]
    fn test_allowed_extensions() {
        let saved = |name: &str| SavedAttachment {
            file_name: name.to_string(),
            path: PathBuf::from(name),
        };
        assert!(saved("m1-resume.PDF").has_allowed_extension());
        assert!(saved("m1-resume.docx").has_allowed_extension());
        assert!(saved("m1-notes.txt").has_allowed_extension());
        assert!(!saved("m1-setup.exe").has_allowed_extension());
        assert!(!saved("m1-README").has_allowed_extension());
    }

    #[tokio::test]
    async fn test_saved_bytes_match_payload() {
        let dir = tempfile::tempdir().unwrap();
        let payload = b"%PDF-1.7 resume bytes".to_vec();
        let root = container(vec![inline("Jane Resume.pdf", &encode(&payload))]);

        let saved = find_and_save_attachment(&FakeMailbox::default(), "m1", &root, dir.path())
            .await
            .unwrap();

        assert_eq!(saved.file_name, "m1-Jane_Resume.pdf");
        let on_disk = tokio::fs::read(dir.path().join("m1-Jane_Resume.pdf"))
            .await
            .unwrap();
        assert_eq!(on_disk, payload);
    }

    #[tokio::test]
    async fn test_first_candidate_in_preorder_wins() {
        let dir = tempfile::tempdir().unwrap();
        let root = container(vec![
            MessagePart {
                mime_type: Some("multipart/alternative".to_string()),
                parts: vec![inline("nested.txt", &encode(b"nested"))],
                ..Default::default()
            },
            inline("later.pdf", &encode(b"later")),
        ]);

        let saved = find_and_save_attachment(&FakeMailbox::default(), "m2", &root, dir.path())
            .await
            .unwrap();

        assert_eq!(saved.file_name, "m2-nested.txt");
        assert!(!dir.path().join("m2-later.pdf").exists());
    }

    #[tokio::test]
    async fn test_remote_attachment_is_fetched() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = FakeMailbox::default().with_attachment("m3", "att-1", &encode(b"remote"));
        let root = container(vec![remote("cv.pdf", "att-1")]);

        let saved = find_and_save_attachment(&mailbox, "m3", &root, dir.path())
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&saved.path).await.unwrap(), b"remote");
        assert_eq!(mailbox.attachment_fetches(), 1);
    }

    #[tokio::test]
    async fn test_failed_candidate_falls_through_to_next() {
        let dir = tempfile::tempdir().unwrap();
        // att-missing is unknown to the fake, so the fetch fails.
        let root = container(vec![
            remote("broken.pdf", "att-missing"),
            inline("bad.pdf", "!!!not base64!!!"),
            inline("good.pdf", &encode(b"good")),
        ]);

        let saved = find_and_save_attachment(&FakeMailbox::default(), "m4", &root, dir.path())
            .await
            .unwrap();

        assert_eq!(saved.file_name, "m4-good.pdf");
    }

    #[tokio::test]
    async fn test_failed_candidate_descends_into_own_children() {
        let dir = tempfile::tempdir().unwrap();
        let mut broken = inline("outer.pdf", "%%%");
        broken.parts = vec![inline("inner.pdf", &encode(b"inner"))];
        let root = container(vec![broken, inline("sibling.pdf", &encode(b"sibling"))]);

        let saved = find_and_save_attachment(&FakeMailbox::default(), "m5", &root, dir.path())
            .await
            .unwrap();

        assert_eq!(saved.file_name, "m5-inner.pdf");
    }

    #[tokio::test]
    async fn test_parts_without_data_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = container(vec![
            MessagePart {
                filename: "empty.pdf".to_string(),
                body: Some(PartBody {
                    size: Some(0),
                    ..Default::default()
                }),
                ..Default::default()
            },
            MessagePart {
                mime_type: Some("text/plain".to_string()),
                body: Some(PartBody {
                    data: Some(encode(b"body text")),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ]);

        let saved =
            find_and_save_attachment(&FakeMailbox::default(), "m6", &root, dir.path()).await;

        assert!(saved.is_none());
        assert!(!dir.path().join("m6-empty.pdf").exists());
    }
}
