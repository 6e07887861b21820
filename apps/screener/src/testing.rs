//! In-memory fakes for the provider seams, shared by unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;

use crate::google::{GoogleApiError, Mailbox, MeetingScheduler, ScheduledMeeting, WatchResponse};
use crate::llm_client::LlmError;
use crate::models::candidate::Verdict;
use crate::models::mail::{Header, Message, MessagePart, MessageRef, PartBody};
use crate::screening::classifier::Classifier;

fn not_found(what: &str) -> GoogleApiError {
    GoogleApiError::Api {
        status: 404,
        message: format!("{what} not found"),
    }
}

#[derive(Default)]
pub struct FakeMailbox {
    history: Vec<MessageRef>,
    history_fails: bool,
    messages: HashMap<String, Message>,
    attachments: HashMap<(String, String), String>,
    watch_response: Option<WatchResponse>,
    watch_fails: bool,
    history_calls: AtomicUsize,
    attachment_fetches: AtomicUsize,
    watched_topics: Mutex<Vec<String>>,
}

impl FakeMailbox {
    /// Adds the message to the history diff and makes it fetchable.
    pub fn with_message(mut self, message: Message) -> Self {
        self.history.push(MessageRef {
            id: message.id.clone(),
            thread_id: message.thread_id.clone(),
        });
        self.messages.insert(message.id.clone(), message);
        self
    }

    /// Lists an id in the history diff that cannot be fetched.
    pub fn with_history_only(mut self, message_id: &str) -> Self {
        self.history.push(MessageRef {
            id: message_id.to_string(),
            thread_id: message_id.to_string(),
        });
        self
    }

    pub fn with_attachment(mut self, message_id: &str, attachment_id: &str, data: &str) -> Self {
        self.attachments.insert(
            (message_id.to_string(), attachment_id.to_string()),
            data.to_string(),
        );
        self
    }

    pub fn with_watch_response(mut self, response: WatchResponse) -> Self {
        self.watch_response = Some(response);
        self
    }

    pub fn failing_history(mut self) -> Self {
        self.history_fails = true;
        self
    }

    pub fn failing_watch(mut self) -> Self {
        self.watch_fails = true;
        self
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn attachment_fetches(&self) -> usize {
        self.attachment_fetches.load(Ordering::SeqCst)
    }

    pub fn watched_topics(&self) -> Vec<String> {
        self.watched_topics.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailbox for FakeMailbox {
    async fn watch(&self, topic_name: &str) -> Result<WatchResponse, GoogleApiError> {
        self.watched_topics
            .lock()
            .unwrap()
            .push(topic_name.to_string());
        if self.watch_fails {
            return Err(not_found("topic"));
        }
        Ok(self.watch_response.clone().unwrap_or(WatchResponse {
            history_id: "500".to_string(),
            expiration: None,
        }))
    }

    async fn list_added_messages(
        &self,
        _start_history_id: &str,
    ) -> Result<Vec<MessageRef>, GoogleApiError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.history_fails {
            return Err(not_found("history"));
        }
        Ok(self.history.clone())
    }

    async fn get_message(&self, message_id: &str) -> Result<Message, GoogleApiError> {
        self.messages
            .get(message_id)
            .cloned()
            .ok_or_else(|| not_found("message"))
    }

    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Option<String>, GoogleApiError> {
        self.attachment_fetches.fetch_add(1, Ordering::SeqCst);
        self.attachments
            .get(&(message_id.to_string(), attachment_id.to_string()))
            .cloned()
            .map(Some)
            .ok_or_else(|| not_found("attachment"))
    }
}

/// A message whose payload carries one inline attachment.
pub fn message_with_attachment(
    id: &str,
    from: &str,
    subject: &str,
    filename: &str,
    bytes: &[u8],
) -> Message {
    let header = |name: &str, value: &str| Header {
        name: name.to_string(),
        value: value.to_string(),
    };
    Message {
        id: id.to_string(),
        thread_id: id.to_string(),
        payload: Some(MessagePart {
            mime_type: Some("multipart/mixed".to_string()),
            headers: vec![header("From", from), header("Subject", subject)],
            parts: vec![
                MessagePart {
                    mime_type: Some("text/plain".to_string()),
                    ..Default::default()
                },
                MessagePart {
                    filename: filename.to_string(),
                    body: Some(PartBody {
                        data: Some(base64::engine::general_purpose::URL_SAFE.encode(bytes)),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }),
    }
}

/// Returns the configured verdict, or an error when none is set.
pub struct FakeClassifier {
    verdict: Option<Verdict>,
    classified: Mutex<Vec<String>>,
}

impl FakeClassifier {
    pub fn new(verdict: Option<Verdict>) -> Self {
        Self {
            verdict,
            classified: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.classified.lock().unwrap().len()
    }

    pub fn classified_files(&self) -> Vec<String> {
        self.classified.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    async fn classify(&self, path: &Path) -> Result<Verdict, LlmError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.classified.lock().unwrap().push(name);
        self.verdict.clone().ok_or(LlmError::EmptyContent)
    }
}

#[derive(Default)]
pub struct FakeScheduler {
    calls: Mutex<Vec<(String, String, String)>>,
}

impl FakeScheduler {
    /// `(sender, recipient, subject)` for each booking, in order.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeetingScheduler for FakeScheduler {
    async fn schedule_meet(
        &self,
        sender: &str,
        recipient: &str,
        subject: &str,
    ) -> Option<ScheduledMeeting> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((sender.to_string(), recipient.to_string(), subject.to_string()));
        Some(ScheduledMeeting {
            event_id: format!("evt-{}", calls.len()),
            meet_link: Some(format!("https://meet.google.com/fake-{}", calls.len())),
        })
    }
}
