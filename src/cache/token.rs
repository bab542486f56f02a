//! Token metadata cache: memory first, then the store, then the RPC

use crate::models::TokenMetadata;
use crate::traits::{CursorStore, SignatureSource};
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lazily populated mint -> metadata mapping. Entries are never invalidated.
#[derive(Clone)]
pub struct TokenMetadataCache {
    cache: Cache<String, TokenMetadata>,
    store: Arc<dyn CursorStore>,
    source: Arc<dyn SignatureSource>,
}

impl TokenMetadataCache {
    pub fn new(capacity: u64, store: Arc<dyn CursorStore>, source: Arc<dyn SignatureSource>) -> Self {
        let cache = Cache::builder().max_capacity(capacity).build();

        Self { cache, store, source }
    }

    /// Resolve metadata for every mint in `mints`.
    ///
    /// Mints the external source cannot describe map to [`TokenMetadata::unknown`]
    /// and are not persisted, so a later call tries again.
    pub async fn resolve(&self, mints: &[String]) -> HashMap<String, TokenMetadata> {
        let mut tokens = HashMap::with_capacity(mints.len());
        let mut missing = Vec::new();

        for mint in mints {
            if tokens.contains_key(mint) || missing.contains(mint) {
                continue;
            }
            match self.cache.get(mint).await {
                Some(metadata) => {
                    tokens.insert(mint.clone(), metadata);
                }
                None => missing.push(mint.clone()),
            }
        }

        if missing.is_empty() {
            return tokens;
        }

        match self.store.get_token_metadata_batch(&missing).await {
            Ok(stored) => {
                for metadata in stored {
                    self.cache.insert(metadata.address.clone(), metadata.clone()).await;
                    tokens.insert(metadata.address.clone(), metadata);
                }
            }
            Err(e) => warn!("Failed to load token metadata from store: {}", e),
        }

        let unresolved: Vec<String> = missing
            .into_iter()
            .filter(|mint| !tokens.contains_key(mint))
            .collect();

        for mint in &unresolved {
            let metadata = match self.source.get_token_metadata(mint).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Failed to fetch token metadata for {}: {}", mint, e);
                    tokens.insert(mint.clone(), TokenMetadata::unknown(mint));
                    continue;
                }
            };

            if let Err(e) = self.store.put_token_metadata(&metadata).await {
                warn!("Failed to persist token metadata for {}: {}", mint, e);
            }
            self.cache.insert(mint.clone(), metadata.clone()).await;
            debug!("Cached token metadata for {}", mint);
            tokens.insert(mint.clone(), metadata);
        }

        tokens
    }
}
