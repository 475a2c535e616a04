use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use super::Notifier;
use crate::models::LifecycleEvent;

pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Each delivery gives up after `timeout` so a stalled endpoint cannot hold up later events.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build webhook client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, url: &str, event: &LifecycleEvent) -> anyhow::Result<()> {
        self.client
            .post(url)
            .json(event)
            .send()
            .await
            .context("failed to reach workflow webhook")?
            .error_for_status()
            .context("workflow webhook returned error")?;

        Ok(())
    }
}
