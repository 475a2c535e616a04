use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::lifecycle::{BookingStore, MergeSummary};
use super::remote::BookingSource;

/// Merges one remote snapshot into the store. A failed fetch leaves the store untouched.
pub async fn refresh_once(
    store: &Mutex<BookingStore>,
    source: &dyn BookingSource,
) -> anyhow::Result<MergeSummary> {
    let bookings = source.fetch_bookings().await?;
    let contacts = match source.fetch_contacts().await {
        Ok(contacts) => contacts,
        Err(e) => {
            tracing::warn!(error = %e, "failed to refresh known contacts");
            None
        }
    };

    let mut store = store
        .lock()
        .map_err(|_| anyhow::anyhow!("booking store lock poisoned"))?;
    Ok(store.merge_from_remote(bookings, contacts)?)
}

/// Handle to the periodic refresh task. Polling only runs while the public view is active.
pub struct PollerHandle {
    active: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn set_active(&self, active: bool) {
        let _ = self.active.send(active);
    }

    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    /// Ends the task and waits for it; an in-flight fetch is abandoned.
    pub async fn stop(self) {
        drop(self.active);
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::error!(error = %e, "poller task panicked");
            }
        }
    }
}

pub fn spawn_poller(
    store: Arc<Mutex<BookingStore>>,
    source: Arc<dyn BookingSource>,
    interval: Duration,
) -> PollerHandle {
    let (active_tx, active_rx) = watch::channel(true);
    let task = tokio::spawn(run_poller(store, source, interval, active_rx));
    PollerHandle {
        active: active_tx,
        task,
    }
}

async fn run_poller(
    store: Arc<Mutex<BookingStore>>,
    source: Arc<dyn BookingSource>,
    interval: Duration,
    mut active: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(interval_secs = interval.as_secs(), "remote poller started");

    loop {
        if !*active.borrow_and_update() {
            // Paused: wait for reactivation or shutdown.
            if active.changed().await.is_err() {
                break;
            }
            continue;
        }

        tokio::select! {
            _ = ticker.tick() => {
                tokio::select! {
                    result = refresh_once(&store, source.as_ref()) => match result {
                        Ok(summary) => tracing::debug!(added = summary.added, "remote refresh complete"),
                        Err(e) => tracing::error!(error = %e, "remote refresh failed"),
                    },
                    changed = active.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            changed = active.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("remote poller stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use tokio::sync::mpsc;

    use super::*;
    use crate::db::MemoryStorage;
    use crate::models::{Booking, BookingStatus, Contact};

    struct FakeSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl BookingSource for FakeSource {
        async fn fetch_bookings(&self) -> anyhow::Result<Vec<Booking>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("remote unavailable");
            }
            Ok(vec![Booking {
                id: "100".to_string(),
                name: "Remote".to_string(),
                email: "r@example.com".to_string(),
                phone: "1".to_string(),
                person_type: String::new(),
                reason: String::new(),
                contact_method: String::new(),
                date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
                time: "09:00".to_string(),
                status: BookingStatus::Accepted,
                created_at: Utc::now(),
            }])
        }

        async fn fetch_contacts(&self) -> anyhow::Result<Option<Vec<Contact>>> {
            Ok(None)
        }
    }

    fn store() -> Arc<Mutex<BookingStore>> {
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(Mutex::new(BookingStore::load(
            Arc::new(MemoryStorage::new()),
            Box::new(tx),
        )))
    }

    #[tokio::test]
    async fn test_refresh_once_merges_bookings() {
        let store = store();
        let source = FakeSource {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let summary = refresh_once(&store, &source).await.unwrap();
        assert_eq!(summary.added, 1);
        assert_eq!(store.lock().unwrap().list_accepted()[0].id, "100");

        let again = refresh_once(&store, &source).await.unwrap();
        assert_eq!(again, MergeSummary::default());
        assert_eq!(store.lock().unwrap().bookings().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_state() {
        let store = store();
        let source = FakeSource {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        assert!(refresh_once(&store, &source).await.is_err());
        assert!(store.lock().unwrap().bookings().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_stops_polling_when_inactive() {
        let store = store();
        let source = Arc::new(FakeSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let handle = spawn_poller(store.clone(), source.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(11)).await;
        let while_active = source.calls.load(Ordering::SeqCst);
        assert!(while_active >= 2);

        handle.set_active(false);
        assert!(!handle.is_active());
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), while_active);

        handle.stop().await;
        assert_eq!(store.lock().unwrap().bookings().len(), 1);
    }
}
