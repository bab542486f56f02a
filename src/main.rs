// Load configuration
// Set up logging
// Open the SQLite store
// Register configured addresses
// Start notification worker, watch scheduler and optional backfills
// Start HTTP server

use swap_indexer::{
    api,
    blockchain::{polling, IncrementalIndexer, SolanaClient},
    cache::TokenMetadataCache,
    config::Config,
    db::{connection, SqliteStore},
    notifications::{ConsoleNotifier, NotificationWorker, TelegramNotifier},
    state::AppState,
    traits::{CursorStore, NotificationDispatcher, SignatureSource},
    validation::validate_solana_address,
};

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting swap-indexer");

    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let db_pool = connection::establish_connection(&config.database_url).await?;
    info!("Database connection established");

    let store: Arc<dyn CursorStore> = Arc::new(SqliteStore::new(db_pool));
    let client: Arc<dyn SignatureSource> = Arc::new(SolanaClient::new(&config));

    let (events_tx, events_rx) = mpsc::channel(config.notification_queue_size);
    let indexer = Arc::new(
        IncrementalIndexer::new(client.clone(), store.clone(), config.signature_page_limit)
            .with_events(events_tx),
    );

    let shutdown = CancellationToken::new();

    register_configured_addresses(&config, &indexer, store.as_ref()).await;

    // Notification delivery runs apart from indexing
    let dispatcher: Arc<dyn NotificationDispatcher> = match TelegramNotifier::from_config(&config) {
        Some(telegram) => {
            info!("Delivering swap notifications to Telegram");
            Arc::new(telegram)
        }
        None => {
            info!("Telegram not configured, logging swap notifications");
            Arc::new(ConsoleNotifier)
        }
    };
    let tokens = TokenMetadataCache::new(config.token_cache_capacity, store.clone(), client.clone());
    let worker = NotificationWorker::new(events_rx, store.clone(), tokens, dispatcher);
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    if config.backfill_on_start {
        spawn_backfills(&indexer, store.as_ref(), &shutdown).await;
    }

    let scheduler_handle = polling::start_polling(indexer.clone(), config.poll_interval, shutdown.clone());
    info!("Watch scheduler started");

    // Ctrl-C cancels every long-running task
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        signal_shutdown.cancel();
    });

    let app_state = Arc::new(AppState {
        store: store.clone(),
        indexer: indexer.clone(),
        shutdown: shutdown.clone(),
    });
    let app = api::create_router(app_state)
        .layer(tower_http::cors::CorsLayer::permissive());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await?;

    let _ = scheduler_handle.await;
    let _ = worker_handle.await;
    info!("swap-indexer stopped");

    Ok(())
}

async fn register_configured_addresses(config: &Config, indexer: &IncrementalIndexer, store: &dyn CursorStore) {
    for address in &config.watch_addresses {
        if let Err(e) = validate_solana_address(address) {
            warn!("Ignoring configured address: {}", e);
            continue;
        }

        match store.get_account_cursors(address).await {
            Ok(Some(_)) => continue,
            Ok(None) => {}
            Err(e) => {
                error!("Failed to read cursors for {}: {}", address, e);
                continue;
            }
        }

        if let Err(e) = indexer.add_account_to_watch(address).await {
            error!("Failed to register {}: {}", address, e);
        }
    }
}

async fn spawn_backfills(indexer: &Arc<IncrementalIndexer>, store: &dyn CursorStore, shutdown: &CancellationToken) {
    let addresses = match store.list_watched_accounts().await {
        Ok(addresses) => addresses,
        Err(e) => {
            error!("Failed to load watched accounts for backfill: {}", e);
            return;
        }
    };

    for address in addresses {
        let indexer = indexer.clone();
        let shutdown = shutdown.child_token();
        tokio::spawn(async move {
            if let Err(e) = indexer.backfill_with_shutdown(&address, &shutdown).await {
                error!("Backfill failed for {}: {}", address, e);
            }
        });
    }
}
