use crate::blockchain::indexer::IncrementalIndexer;
use crate::traits::CursorStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Single-slot lock: at most one holder, released on drop (including unwinding
/// and task cancellation).
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    pub fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Outcome of a forward-discovery pass over every watched address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub addresses: usize,
    pub processed: usize,
    pub swaps: usize,
    pub failures: usize,
}

pub enum TickOutcome {
    Started(JoinHandle<PassReport>),
    /// The previous pass was still running; this tick is dropped, not queued.
    Skipped,
}

/// Fixed-interval driver for forward discovery.
pub struct WatchScheduler {
    indexer: Arc<IncrementalIndexer>,
    store: Arc<dyn CursorStore>,
    period: Duration,
    in_flight: Arc<AtomicBool>,
}

impl WatchScheduler {
    pub fn new(indexer: Arc<IncrementalIndexer>, period: Duration) -> Self {
        let store = indexer.store().clone();
        Self {
            indexer,
            store,
            period,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a pass unless one is already in flight.
    pub fn tick(&self) -> TickOutcome {
        let Some(guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            debug!("Previous pass still running, skipping tick");
            return TickOutcome::Skipped;
        };

        let indexer = self.indexer.clone();
        let store = self.store.clone();
        TickOutcome::Started(tokio::spawn(async move {
            let _guard = guard;
            run_pass(&indexer, store.as_ref()).await
        }))
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!("Starting watch scheduler, interval {:?}", self.period);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut current: Option<JoinHandle<PassReport>> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let TickOutcome::Started(handle) = self.tick() {
                        current = Some(handle);
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Shutting down watch scheduler");
                    break;
                }
            }
        }

        // Let an in-flight pass finish its current signature work
        if let Some(handle) = current {
            if let Err(e) = handle.await {
                error!("Forward pass task failed: {}", e);
            }
        }
    }
}

/// One sequential forward pass over all watched addresses. A failing address is
/// logged and left for the next tick; its cursor still marks the resume point.
pub async fn run_pass(indexer: &IncrementalIndexer, store: &dyn CursorStore) -> PassReport {
    let mut report = PassReport::default();

    let addresses = match store.list_watched_accounts().await {
        Ok(addresses) => addresses,
        Err(e) => {
            error!("Failed to load watched accounts: {}", e);
            report.failures += 1;
            return report;
        }
    };

    for address in addresses {
        report.addresses += 1;
        match indexer.find_new(&address).await {
            Ok(summary) => {
                report.processed += summary.processed;
                report.swaps += summary.swaps;
            }
            Err(e) => {
                error!("Forward pass failed for {}: {}", address, e);
                report.failures += 1;
            }
        }
    }

    if report.processed > 0 {
        info!(
            "Pass finished: {} signatures, {} swaps across {} accounts",
            report.processed, report.swaps, report.addresses
        );
    }
    report
}

/// Spawn a [`WatchScheduler`] for `indexer` on the runtime.
pub fn start_polling(
    indexer: Arc<IncrementalIndexer>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(WatchScheduler::new(indexer, period).run(shutdown))
}
