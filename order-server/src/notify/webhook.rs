//! Webhook transport for customer notifications

use std::time::Duration;

use async_trait::async_trait;

use super::{CustomerNotification, CustomerNotifier, NotifyError};

/// POSTs each notification as JSON to a fixed URL
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CustomerNotifier for WebhookNotifier {
    async fn notify(&self, notification: &CustomerNotification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(format!(
                "webhook returned {} for order {}",
                status, notification.order_id
            )));
        }
        Ok(())
    }
}
