//! SMS gateway delivery over an HTTP webhook, with exponential-backoff retry.
//!
//! The gateway receives `{"guard_id", "title", "message", ...}` as JSON and is
//! responsible for resolving the guard's phone number.

use std::time::Duration;

use super::GuardNotification;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// Network, DNS, timeout or client construction failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SMS gateway returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// SmsWebhook
// ---------------------------------------------------------------------------

/// Posts guard notifications to an SMS gateway endpoint.
pub struct SmsWebhook {
    client: reqwest::Client,
    url: String,
}

impl SmsWebhook {
    pub fn new(url: impl Into<String>) -> Result<Self, SmsError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver with up to three retries before giving up.
    pub async fn deliver(&self, notification: &GuardNotification) -> Result<(), SmsError> {
        let mut last_err: Option<SmsError> = None;

        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.try_send(notification).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        guard_id = notification.guard_id,
                        error = %e,
                        "SMS delivery attempt failed, retrying"
                    );
                    last_err = Some(e);
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        match self.try_send(notification).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(
                    guard_id = notification.guard_id,
                    error = %e,
                    "SMS delivery failed after all retries"
                );
                Err(last_err.unwrap_or(e))
            }
        }
    }

    async fn try_send(&self, notification: &GuardNotification) -> Result<(), SmsError> {
        let response = self.client.post(&self.url).json(notification).send().await?;
        if !response.status().is_success() {
            return Err(SmsError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keeps_url() {
        let sms = SmsWebhook::new("http://sms.local/send").unwrap();
        assert_eq!(sms.url(), "http://sms.local/send");
    }

    #[test]
    fn error_display_http_status() {
        assert_eq!(
            SmsError::HttpStatus(502).to_string(),
            "SMS gateway returned HTTP 502"
        );
    }
}
