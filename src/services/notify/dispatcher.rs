use std::sync::Arc;

use tokio::sync::mpsc;

use super::Notifier;
use crate::db::storage::{Storage, WEBHOOK_URL_KEY};
use crate::models::LifecycleEvent;

/// Resolves the webhook URL per event: the stored value wins, then the configured fallback.
pub fn resolve_webhook_url(storage: &dyn Storage, fallback: &str) -> Option<String> {
    let stored = match storage.get(WEBHOOK_URL_KEY) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "failed to read webhook url");
            None
        }
    };

    stored
        .or_else(|| Some(fallback.to_string()))
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Best-effort relay of one event. Failures are logged and never retried.
pub async fn dispatch(notifier: &dyn Notifier, url: Option<&str>, event: &LifecycleEvent) {
    let Some(url) = url else {
        tracing::debug!(event = event.event.as_str(), "no webhook configured, skipping");
        return;
    };

    match notifier.notify(url, event).await {
        Ok(()) => {
            tracing::info!(
                event = event.event.as_str(),
                booking_id = %event.data.booking.id,
                "lifecycle event delivered"
            );
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                event = event.event.as_str(),
                booking_id = %event.data.booking.id,
                "failed to deliver lifecycle event"
            );
        }
    }
}

/// Drains the event channel until every sender is gone.
pub async fn run_dispatcher(
    mut rx: mpsc::UnboundedReceiver<LifecycleEvent>,
    notifier: Arc<dyn Notifier>,
    storage: Arc<dyn Storage>,
    fallback_url: String,
) {
    while let Some(event) = rx.recv().await {
        let url = resolve_webhook_url(storage.as_ref(), &fallback_url);
        dispatch(notifier.as_ref(), url.as_deref(), &event).await;
    }
    tracing::info!("event dispatcher stopped");
}
