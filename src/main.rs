use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

use edgebook::config::AppConfig;
use edgebook::db::{self, SqliteStorage, Storage};
use edgebook::handlers;
use edgebook::services::auth::SharedSecret;
use edgebook::services::lifecycle::BookingStore;
use edgebook::services::notify::dispatcher::run_dispatcher;
use edgebook::services::notify::webhook::WebhookNotifier;
use edgebook::services::notify::EventBus;
use edgebook::services::poller::spawn_poller;
use edgebook::services::remote::{BookingSource, HttpBookingSource};
use edgebook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(conn));

    let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
    let (events_tx, _) = broadcast::channel(256);

    let store = BookingStore::load(
        storage.clone(),
        Box::new(EventBus::new(dispatch_tx, events_tx.clone())),
    );
    let store = Arc::new(Mutex::new(store));

    if config.webhook_url.is_empty() {
        tracing::info!("no WEBHOOK_URL set; events are relayed only once a URL is stored");
    }
    let notifier = WebhookNotifier::new(config.http_timeout())?;
    let dispatcher = tokio::spawn(run_dispatcher(
        dispatch_rx,
        Arc::new(notifier),
        storage.clone(),
        config.webhook_url.clone(),
    ));

    let remote: Option<Arc<dyn BookingSource>> = if config.remote_source_url.is_empty() {
        None
    } else {
        tracing::info!("using remote booking source (url: {})", config.remote_source_url);
        Some(Arc::new(HttpBookingSource::new(
            config.remote_source_url.clone(),
            config.http_timeout(),
        )?))
    };
    let poller = remote.clone().map(|source| {
        spawn_poller(
            store.clone(),
            source,
            Duration::from_secs(config.poll_interval_secs),
        )
    });

    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        auth: Box::new(SharedSecret::new(config.admin_token.clone())),
        events_tx,
        remote,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(poller) = poller {
        poller.stop().await;
    }
    // Pending webhook deliveries are abandoned with the process.
    dispatcher.abort();

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
