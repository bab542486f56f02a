// Incremental indexing of an account's signature history.
//
// Forward discovery walks from the newest processed signature towards the chain
// tip and replays strictly oldest first. Backfill walks from the oldest reached
// signature towards genesis, one page at a time, until the feed runs dry.
// In both directions a cursor is written only after the signature it names has
// been fully processed, so a restart resumes without skipping anything.

use crate::blockchain::client::ClientError;
use crate::blockchain::detector::detect_swap;
use crate::db::StoreError;
use crate::models::{AccountWatch, CursorUpdate, SignatureInfo, SwapEvent, SwapRecord};
use crate::traits::{CursorStore, SignatureQuery, SignatureSource};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Signature source error: {0}")]
    Source(#[from] ClientError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No signatures found for address {0}")]
    NoSignatures(String),

    #[error("Backfill already running for address {0}")]
    BackfillRunning(String),
}

/// Counts for one forward or backward traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub processed: usize,
    pub swaps: usize,
}

/// Claim on one address's backward cursor; released on drop.
struct BackfillSlot<'a> {
    running: &'a Mutex<HashSet<String>>,
    address: String,
}

impl<'a> BackfillSlot<'a> {
    fn try_claim(running: &'a Mutex<HashSet<String>>, address: &str) -> Option<Self> {
        let mut addresses = running.lock().unwrap_or_else(PoisonError::into_inner);
        addresses.insert(address.to_string()).then(|| Self {
            running,
            address: address.to_string(),
        })
    }
}

impl Drop for BackfillSlot<'_> {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.address);
    }
}

pub struct IncrementalIndexer {
    source: Arc<dyn SignatureSource>,
    store: Arc<dyn CursorStore>,
    events: Option<mpsc::Sender<SwapEvent>>,
    page_limit: usize,
    backfills: Mutex<HashSet<String>>,
}

impl IncrementalIndexer {
    pub fn new(source: Arc<dyn SignatureSource>, store: Arc<dyn CursorStore>, page_limit: usize) -> Self {
        Self {
            source,
            store,
            events: None,
            page_limit: page_limit.max(1),
            backfills: Mutex::new(HashSet::new()),
        }
    }

    /// Queue detected forward swaps on `events` for notification delivery.
    pub fn with_events(mut self, events: mpsc::Sender<SwapEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn store(&self) -> &Arc<dyn CursorStore> {
        &self.store
    }

    pub fn is_backfilling(&self, address: &str) -> bool {
        self.backfills
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(address)
    }

    /// Register `address`, seeding both cursors at its most recent signature.
    ///
    /// Calling this again re-seeds and discards earlier progress. The seed
    /// transaction itself is processed here since both traversals exclude it.
    pub async fn add_account_to_watch(&self, address: &str) -> Result<AccountWatch, IndexerError> {
        let latest = self
            .source
            .list_finalized_signatures(
                address,
                SignatureQuery {
                    limit: 1,
                    ..SignatureQuery::default()
                },
            )
            .await?;

        let Some(seed) = latest.into_iter().next() else {
            return Err(IndexerError::NoSignatures(address.to_string()));
        };

        self.process_signature(&seed.signature).await?;
        let watch = self.store.seed_account(address, &seed.signature).await?;
        info!("Watching {} from signature {}", address, seed.signature);

        Ok(watch)
    }

    /// Stored cursors for a watched `address`, seeding them first when either is
    /// unset. `None` when the address is not watched; only registration adds one.
    async fn cursors_or_seed(&self, address: &str) -> Result<Option<(AccountWatch, bool)>, IndexerError> {
        match self.store.get_account_cursors(address).await? {
            None => {
                debug!("{} is not watched, skipping", address);
                Ok(None)
            }
            Some(watch) if watch.signature_from.is_some() && watch.signature_to.is_some() => {
                Ok(Some((watch, false)))
            }
            Some(_) => {
                debug!("No cursors for {}, seeding", address);
                Ok(Some((self.add_account_to_watch(address).await?, true)))
            }
        }
    }

    /// Forward discovery: process every signature newer than `signature_from`,
    /// oldest first, advancing the cursor after each one.
    pub async fn find_new(&self, address: &str) -> Result<PassSummary, IndexerError> {
        debug!("Find new signatures for {}", address);
        let mut summary = PassSummary::default();
        let Some((watch, seeded)) = self.cursors_or_seed(address).await? else {
            return Ok(summary);
        };

        let Some(signature_from) = watch.signature_from.filter(|_| !seeded) else {
            return Ok(summary);
        };

        let pending = self.collect_newer_signatures(address, &signature_from).await?;
        if pending.is_empty() {
            return Ok(summary);
        }
        debug!("Found {} new signatures for {}", pending.len(), address);

        for info in pending.iter().rev() {
            let swap = self.process_signature(&info.signature).await?;
            self.store
                .set_account_cursors(address, CursorUpdate::forward(&info.signature))
                .await?;
            summary.processed += 1;

            if let Some(swap) = swap {
                summary.swaps += 1;
                self.emit(address, swap);
            }
        }

        info!(
            "Processed {} new signatures for {} ({} swaps)",
            summary.processed, address, summary.swaps
        );
        Ok(summary)
    }

    /// Everything newer than `until`, newest first, across as many pages as needed.
    async fn collect_newer_signatures(
        &self,
        address: &str,
        until: &str,
    ) -> Result<Vec<SignatureInfo>, IndexerError> {
        let mut collected: Vec<SignatureInfo> = Vec::new();
        let mut before: Option<String> = None;

        loop {
            let page = self
                .source
                .list_finalized_signatures(
                    address,
                    SignatureQuery {
                        limit: self.page_limit,
                        until: Some(until.to_string()),
                        before: before.clone(),
                    },
                )
                .await?;

            let exhausted = page.len() < self.page_limit;
            before = page.last().map(|info| info.signature.clone());
            collected.extend(page);

            if exhausted || before.is_none() {
                return Ok(collected);
            }
        }
    }

    /// Backward backfill over the full history. See [`Self::backfill_with_shutdown`].
    pub async fn backfill_all(&self, address: &str) -> Result<PassSummary, IndexerError> {
        self.backfill_with_shutdown(address, &CancellationToken::new()).await
    }

    /// Page backwards from `signature_to` until an empty page, which marks the
    /// history as consumed; later calls return immediately. Cancellation is
    /// checked between signatures, after the cursor write. At most one backfill
    /// runs per address; a concurrent call fails with
    /// [`IndexerError::BackfillRunning`] without touching the cursor.
    pub async fn backfill_with_shutdown(
        &self,
        address: &str,
        shutdown: &CancellationToken,
    ) -> Result<PassSummary, IndexerError> {
        let Some(_slot) = BackfillSlot::try_claim(&self.backfills, address) else {
            warn!("Backfill for {} already running", address);
            return Err(IndexerError::BackfillRunning(address.to_string()));
        };

        info!("Start backfill for {}", address);
        let mut summary = PassSummary::default();
        let Some((watch, _)) = self.cursors_or_seed(address).await? else {
            return Ok(summary);
        };

        if watch.backfill_complete {
            debug!("Backfill for {} already complete", address);
            return Ok(summary);
        }

        let mut signature_to = watch.signature_to;

        loop {
            let page = self
                .source
                .list_finalized_signatures(
                    address,
                    SignatureQuery {
                        limit: self.page_limit,
                        until: None,
                        before: signature_to.clone(),
                    },
                )
                .await?;

            if page.is_empty() {
                self.store
                    .set_account_cursors(address, CursorUpdate::backfill_finished())
                    .await?;
                info!(
                    "Finished backfill for {} ({} signatures, {} swaps)",
                    address, summary.processed, summary.swaps
                );
                return Ok(summary);
            }

            let total = page.len();
            for (index, info) in page.iter().enumerate() {
                debug!("Backfill {} | {} of {}", info.signature, index + 1, total);

                if self.process_signature(&info.signature).await?.is_some() {
                    summary.swaps += 1;
                }
                self.store
                    .set_account_cursors(address, CursorUpdate::backward(&info.signature))
                    .await?;
                summary.processed += 1;

                if shutdown.is_cancelled() {
                    info!("Backfill for {} interrupted at {}", address, info.signature);
                    return Ok(summary);
                }
            }

            signature_to = page.last().map(|info| info.signature.clone());
        }
    }

    /// Fetch, classify and persist one signature.
    ///
    /// A transaction that cannot be decoded is logged and counts as "no swap" so
    /// the cursor can move past it.
    pub async fn process_signature(&self, signature: &str) -> Result<Option<SwapRecord>, IndexerError> {
        let tx = match self.source.get_parsed_transaction(signature).await {
            Ok(tx) => tx,
            Err(e @ ClientError::Malformed { .. }) => {
                warn!("Skipping undecodable transaction: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let swap = match detect_swap(signature, &tx) {
            Ok(Some(swap)) => swap,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("Skipping malformed transaction {}: {}", signature, e);
                return Ok(None);
            }
        };

        self.store.put_swap_record(&swap).await?;
        info!(
            "Add swap {}: +{} {} -{} {}",
            signature, swap.token_in.amount, swap.token_in.mint, swap.token_out.amount, swap.token_out.mint
        );

        Ok(Some(swap))
    }

    /// Hand a swap to the notification worker without waiting on delivery.
    fn emit(&self, address: &str, swap: SwapRecord) {
        let Some(events) = &self.events else {
            return;
        };

        let event = SwapEvent {
            address: address.to_string(),
            swap,
        };
        match events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Notification queue full, dropping swap {}", event.swap.signature)
            }
            Err(TrySendError::Closed(event)) => {
                warn!("Notification worker stopped, dropping swap {}", event.swap.signature)
            }
        }
    }
}
