//! Push notification dispatch.
//!
//! [`AlertSink`] is the transport seam; [`NtfyNotifier`] posts to an
//! ntfy-style topic. Callers go through [`dispatch`], which logs and swallows
//! failures so a lost notification never stops monitoring.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use crate::alerts::Alert;
use crate::config::NtfyChannel;
use crate::error::NotifyError;

// ---

#[async_trait]
pub trait AlertSink: Send + Sync + 'static {
    /// Deliver one alert to a channel. Non-2xx responses are errors.
    async fn notify(&self, channel: &NtfyChannel, alert: &Alert) -> Result<(), NotifyError>;
}

/// Posts alerts to an ntfy topic with title, tags and priority carried in
/// headers and the message as the body.
#[derive(Debug, Clone, Default)]
pub struct NtfyNotifier {
    http: Client,
}

impl NtfyNotifier {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AlertSink for NtfyNotifier {
    async fn notify(&self, channel: &NtfyChannel, alert: &Alert) -> Result<(), NotifyError> {
        // ---
        let response = self
            .http
            .post(&channel.topic)
            .basic_auth(&channel.auth.username, Some(&channel.auth.password))
            .header("Title", &alert.title)
            .header("Tags", alert.tags)
            .header("Priority", alert.priority.as_str())
            .body(alert.body.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Send an alert, logging instead of propagating any failure.
pub async fn dispatch<N>(sink: &N, channel: &NtfyChannel, alert: &Alert)
where
    N: AlertSink + ?Sized,
{
    // ---
    match sink.notify(channel, alert).await {
        Ok(()) => debug!(
            title = %alert.title,
            priority = alert.priority.as_str(),
            "Notification sent"
        ),
        Err(e) => error!(title = %alert.title, "Failed to send notification: {}", e),
    }
}
