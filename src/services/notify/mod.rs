pub mod dispatcher;
pub mod webhook;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::models::LifecycleEvent;

/// Outbound relay for lifecycle events.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, url: &str, event: &LifecycleEvent) -> anyhow::Result<()>;
}

/// Where the lifecycle store publishes committed transitions. Must not block.
pub trait EventSink: Send {
    fn emit(&self, event: LifecycleEvent);
}

impl EventSink for mpsc::UnboundedSender<LifecycleEvent> {
    fn emit(&self, event: LifecycleEvent) {
        if self.send(event).is_err() {
            tracing::warn!("event dispatcher has shut down, dropping lifecycle event");
        }
    }
}

/// Production sink: feeds the webhook dispatcher and any live SSE subscribers.
pub struct EventBus {
    dispatch_tx: mpsc::UnboundedSender<LifecycleEvent>,
    live_tx: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    pub fn new(
        dispatch_tx: mpsc::UnboundedSender<LifecycleEvent>,
        live_tx: broadcast::Sender<LifecycleEvent>,
    ) -> Self {
        Self {
            dispatch_tx,
            live_tx,
        }
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: LifecycleEvent) {
        // No SSE receivers is the common case.
        let _ = self.live_tx.send(event.clone());
        self.dispatch_tx.emit(event);
    }
}
