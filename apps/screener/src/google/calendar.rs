//! Google Calendar API v3: Meet-enabled event insertion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use super::{ensure_success, GoogleApiError, GoogleAuth};

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";
const MEETING_DURATION_MINUTES: i64 = 30;
const MEETING_LEAD_MINUTES: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledMeeting {
    pub event_id: String,
    pub meet_link: Option<String>,
}

/// Books a video call between a candidate and the hiring manager.
/// Failures are logged and surface as `None`; a missed call never aborts a batch.
#[async_trait]
pub trait MeetingScheduler: Send + Sync {
    async fn schedule_meet(
        &self,
        sender: &str,
        recipient: &str,
        subject: &str,
    ) -> Option<ScheduledMeeting>;
}

// ============================================================================
// API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Vec<Attendee>,
    pub conference_data: ConferenceData,
    pub reminders: Reminders,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: DateTime<Utc>,
    pub time_zone: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Attendee {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceData {
    pub create_request: CreateConferenceRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConferenceRequest {
    pub request_id: String,
    pub conference_solution_key: ConferenceSolutionKey,
}

#[derive(Debug, Serialize)]
pub struct ConferenceSolutionKey {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    pub overrides: Vec<ReminderOverride>,
}

#[derive(Debug, Serialize)]
pub struct ReminderOverride {
    pub method: &'static str,
    pub minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    id: String,
    #[serde(default)]
    hangout_link: Option<String>,
}

/// A 30-minute call starting ten minutes after `now`.
pub fn build_meet_event(
    sender: &str,
    recipient: &str,
    subject: &str,
    now: DateTime<Utc>,
) -> EventRequest {
    let start = now + Duration::minutes(MEETING_LEAD_MINUTES);
    let end = start + Duration::minutes(MEETING_DURATION_MINUTES);
    let local_part = sender.split('@').next().unwrap_or(sender);

    EventRequest {
        summary: format!("Meeting regarding: {subject}"),
        description: format!("Scheduled automatically based on email received from {sender}."),
        start: EventTime {
            date_time: start,
            time_zone: "UTC",
        },
        end: EventTime {
            date_time: end,
            time_zone: "UTC",
        },
        attendees: vec![
            Attendee {
                email: sender.to_string(),
            },
            Attendee {
                email: recipient.to_string(),
            },
        ],
        conference_data: ConferenceData {
            create_request: CreateConferenceRequest {
                request_id: format!("meet-{local_part}-{}", Uuid::new_v4().simple()),
                conference_solution_key: ConferenceSolutionKey {
                    kind: "hangoutsMeet",
                },
            },
        },
        reminders: Reminders {
            use_default: false,
            overrides: vec![ReminderOverride {
                method: "popup",
                minutes: 10,
            }],
        },
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct GoogleCalendar {
    http: Client,
    auth: Arc<GoogleAuth>,
}

impl GoogleCalendar {
    pub fn new(auth: Arc<GoogleAuth>) -> Self {
        Self {
            http: Client::new(),
            auth,
        }
    }

    async fn insert_event(&self, event: &EventRequest) -> Result<EventResponse, GoogleApiError> {
        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .post(EVENTS_URL)
            .bearer_auth(&token)
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", "all")])
            .json(event)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }
}

#[async_trait]
impl MeetingScheduler for GoogleCalendar {
    async fn schedule_meet(
        &self,
        sender: &str,
        recipient: &str,
        subject: &str,
    ) -> Option<ScheduledMeeting> {
        if sender.is_empty() || recipient.is_empty() {
            error!("Cannot schedule meet: missing sender or recipient email");
            return None;
        }

        info!("Scheduling Meet between {sender} and {recipient} regarding: {subject}");
        let event = build_meet_event(sender, recipient, subject, Utc::now());

        match self.insert_event(&event).await {
            Ok(created) => {
                info!(
                    "Scheduled Google Meet: event {}, link {}",
                    created.id,
                    created.hangout_link.as_deref().unwrap_or("N/A")
                );
                Some(ScheduledMeeting {
                    event_id: created.id,
                    meet_link: created.hangout_link,
                })
            }
            Err(e) => {
                error!("Error scheduling Google Meet: {e}");
                None
            }
        }
    }
}
