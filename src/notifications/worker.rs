use crate::cache::TokenMetadataCache;
use crate::models::{SwapContext, SwapEvent, SwapRecord};
use crate::traits::{CursorStore, NotificationDispatcher};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Swap history for the traded token plus metadata for every mint involved.
pub async fn build_swap_context(
    store: &dyn CursorStore,
    tokens: &TokenMetadataCache,
    address: &str,
    swap: &SwapRecord,
) -> SwapContext {
    let swaps = match store.get_swap_history(address, swap.traded_mint()).await {
        Ok(swaps) if !swaps.is_empty() => swaps,
        Ok(_) => vec![swap.clone()],
        Err(e) => {
            warn!("Failed to load swap history for {}: {}", address, e);
            vec![swap.clone()]
        }
    };

    let mut mints: Vec<String> = Vec::new();
    for mint in swaps.iter().flat_map(|s| s.mints()).chain(swap.mints()) {
        if !mints.iter().any(|m| m == mint) {
            mints.push(mint.to_string());
        }
    }

    let tokens = tokens.resolve(&mints).await;
    SwapContext { swaps, tokens }
}

/// Consumes queued swap events and delivers them. Delivery failures are logged
/// and dropped; they never reach the indexer.
pub struct NotificationWorker {
    receiver: mpsc::Receiver<SwapEvent>,
    store: Arc<dyn CursorStore>,
    tokens: TokenMetadataCache,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl NotificationWorker {
    pub fn new(
        receiver: mpsc::Receiver<SwapEvent>,
        store: Arc<dyn CursorStore>,
        tokens: TokenMetadataCache,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            receiver,
            store,
            tokens,
            dispatcher,
        }
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Notification worker started");

        loop {
            tokio::select! {
                event = self.receiver.recv() => {
                    match event {
                        Some(event) => self.handle(event).await,
                        None => {
                            info!("Notification channel closed, shutting down");
                            break;
                        }
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Shutting down notification worker");
                    break;
                }
            }
        }
    }

    pub async fn handle(&self, event: SwapEvent) {
        let context = build_swap_context(self.store.as_ref(), &self.tokens, &event.address, &event.swap).await;

        match self.dispatcher.dispatch(&event.address, &event.swap, &context).await {
            Ok(()) => debug!("Delivered swap {}", event.swap.signature),
            Err(e) => warn!("Failed to deliver swap {}: {}", event.swap.signature, e),
        }
    }
}
