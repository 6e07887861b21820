//! Periodic mailbox watch renewal.
//!
//! Gmail watches lapse after about seven days. The job checks twice a day and
//! re-registers when the stored expiry is missing or no more than a day away.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::google::{GoogleAuth, Mailbox};
use crate::screening::watch::setup_watch;
use crate::storage::CursorStore;

const FIRST_CHECK_DELAY: Duration = Duration::from_secs(30);
const CHECK_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

fn renewal_threshold() -> chrono::Duration {
    chrono::Duration::hours(24)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalOutcome {
    NotAuthenticated,
    StillValid,
    Renewed,
    Failed,
}

/// True when there is no recorded expiry or it falls within the renewal window.
pub fn needs_renewal(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expiry {
        None => true,
        Some(expiry) => expiry - now <= renewal_threshold(),
    }
}

pub struct WatchRenewal {
    pub auth: Arc<GoogleAuth>,
    pub mailbox: Arc<dyn Mailbox>,
    pub cursor: Arc<CursorStore>,
    pub topic_name: String,
}

impl WatchRenewal {
    pub async fn renew_if_needed(&self, now: DateTime<Utc>) -> RenewalOutcome {
        if !self.auth.is_authenticated().await {
            debug!("Skipping watch renewal: application not authenticated");
            return RenewalOutcome::NotAuthenticated;
        }

        let expiry = self.cursor.watch_expiry().await;
        if !needs_renewal(expiry, now) {
            debug!(
                "Watch still valid until {}",
                expiry.map(|e| e.to_rfc3339()).unwrap_or_default()
            );
            return RenewalOutcome::StillValid;
        }

        info!("Gmail watch expiring or missing, renewing");
        match setup_watch(self.mailbox.as_ref(), &self.cursor, &self.topic_name).await {
            Ok(_) => RenewalOutcome::Renewed,
            Err(e) => {
                error!("Failed to renew Gmail watch: {e}");
                RenewalOutcome::Failed
            }
        }
    }

    /// First check shortly after startup, then every twelve hours.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Watch renewal job started, checking every {}h",
                CHECK_INTERVAL.as_secs() / 3600
            );
            let start = tokio::time::Instant::now() + FIRST_CHECK_DELAY;
            let mut tick = tokio::time::interval_at(start, CHECK_INTERVAL);
            loop {
                tick.tick().await;
                self.renew_if_needed(Utc::now()).await;
            }
        })
    }
}
