//! Notification pipeline: history diff → attachment → classification → meeting.
//!
//! One notification is processed at a time. Messages within a batch are
//! handled sequentially and independently; a failing message is logged and
//! the batch moves on. The cursor advances only after the whole batch has
//! been attempted, so a crash mid-batch means the provider redelivers it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::google::{Mailbox, MeetingScheduler, ScheduledMeeting};
use crate::models::candidate::QualifiedCandidate;
use crate::models::mail::MessageRef;
use crate::screening::attachment::find_and_save_attachment;
use crate::screening::classifier::Classifier;
use crate::screening::sender::extract_email_from_header;
use crate::storage::{CandidateStore, CursorStore};

/// Decoded push notification: the watched mailbox and its new history id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub email_address: String,
    pub history_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// No cursor existed; the notification's id became the baseline.
    Baseline { history_id: String },
    NoNewMessages { cursor: String },
    Processed {
        messages: usize,
        failed: usize,
        cursor: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    NoAttachment,
    NoSender,
    DisallowedExtension(String),
    NotQualified,
    Qualified { meeting: Option<ScheduledMeeting> },
}

pub struct Pipeline {
    cursor: Arc<CursorStore>,
    mailbox: Arc<dyn Mailbox>,
    classifier: Arc<dyn Classifier>,
    scheduler: Arc<dyn MeetingScheduler>,
    candidates: Arc<CandidateStore>,
    attachments_dir: PathBuf,
    batch_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        cursor: Arc<CursorStore>,
        mailbox: Arc<dyn Mailbox>,
        classifier: Arc<dyn Classifier>,
        scheduler: Arc<dyn MeetingScheduler>,
        candidates: Arc<CandidateStore>,
        attachments_dir: PathBuf,
    ) -> Self {
        Self {
            cursor,
            mailbox,
            classifier,
            scheduler,
            candidates,
            attachments_dir,
            batch_lock: Mutex::new(()),
        }
    }

    pub async fn process_notification(&self, notification: &Notification) -> Result<BatchOutcome> {
        let _batch = self.batch_lock.lock().await;

        let Some(last_history_id) = self.cursor.last_history_id().await else {
            warn!(
                "No previous history ID found. Storing {} as baseline",
                notification.history_id
            );
            let stored = self.cursor.advance_history_id(&notification.history_id).await?;
            return Ok(BatchOutcome::Baseline { history_id: stored });
        };

        let messages = self
            .mailbox
            .list_added_messages(&last_history_id)
            .await
            .with_context(|| format!("Failed to list history since {last_history_id}"))?;

        if messages.is_empty() {
            let cursor = self.cursor.advance_history_id(&notification.history_id).await?;
            info!("No new messages to handle. History ID now {cursor}");
            return Ok(BatchOutcome::NoNewMessages { cursor });
        }

        let mut failed = 0;
        for message in &messages {
            info!("--- Processing message {} ---", message.id);
            match self.process_message(message, &notification.email_address).await {
                Ok(outcome) => info!("Message {} finished: {outcome:?}", message.id),
                Err(e) => {
                    failed += 1;
                    error!("Error processing message {}: {e:#}", message.id);
                }
            }
        }

        let cursor = self.cursor.advance_history_id(&notification.history_id).await?;
        info!(
            "Batch complete: {} message(s), {failed} failed. History ID now {cursor}",
            messages.len()
        );
        Ok(BatchOutcome::Processed {
            messages: messages.len(),
            failed,
            cursor,
        })
    }

    async fn process_message(&self, message: &MessageRef, recipient: &str) -> Result<MessageOutcome> {
        let detail = self.mailbox.get_message(&message.id).await?;
        let Some(payload) = detail.payload.as_ref() else {
            return Ok(MessageOutcome::NoAttachment);
        };

        let subject = payload.header("Subject").unwrap_or("No Subject");
        let from = payload.header("From").unwrap_or("Unknown Sender");
        let sender = extract_email_from_header(from);
        info!(
            "Subject: {subject} | From: {from} (extracted: {}) | To: {recipient}",
            sender.as_deref().unwrap_or("N/A")
        );

        let Some(saved) = find_and_save_attachment(
            self.mailbox.as_ref(),
            &message.id,
            payload,
            &self.attachments_dir,
        )
        .await
        else {
            return Ok(MessageOutcome::NoAttachment);
        };

        let Some(sender) = sender else {
            warn!("Skipping screening: sender email could not be extracted");
            return Ok(MessageOutcome::NoSender);
        };

        if !saved.has_allowed_extension() {
            let ext = saved.extension().unwrap_or_default();
            warn!("Skipping screening: file extension '{ext}' is not allowed");
            return Ok(MessageOutcome::DisallowedExtension(ext));
        }

        let verdict = self.classifier.classify(&saved.path).await?;
        info!("Candidate {} qualified: {}", verdict.name, verdict.qualified);
        if !verdict.qualified {
            return Ok(MessageOutcome::NotQualified);
        }

        let meeting = self.scheduler.schedule_meet(&sender, recipient, subject).await;
        let meet_link = meeting.as_ref().and_then(|m| m.meet_link.clone());
        self.candidates
            .push(QualifiedCandidate::from_verdict(&verdict, meet_link))
            .await?;

        Ok(MessageOutcome::Qualified { meeting })
    }
}
