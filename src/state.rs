use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::LifecycleEvent;
use crate::services::auth::AdminAuth;
use crate::services::lifecycle::BookingStore;
use crate::services::remote::BookingSource;

pub struct AppState {
    pub store: Arc<Mutex<BookingStore>>,
    pub config: AppConfig,
    pub auth: Box<dyn AdminAuth>,
    pub events_tx: broadcast::Sender<LifecycleEvent>,
    pub remote: Option<Arc<dyn BookingSource>>,
}

impl AppState {
    pub fn store(&self) -> Result<MutexGuard<'_, BookingStore>, AppError> {
        self.store
            .lock()
            .map_err(|_| AppError::Internal("booking store lock poisoned".to_string()))
    }
}
