//! Watch scheduler ticking and the single in-flight pass guard

#[cfg(test)]
mod tests {
    use crate::blockchain::indexer::IncrementalIndexer;
    use crate::blockchain::polling::{run_pass, start_polling, InFlightGuard, PassReport, TickOutcome, WatchScheduler};
    use crate::tests::mocks::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    const OTHER: &str = "Other11111111111111111111111111111111111111";

    async fn watched(source: &Arc<MockSource>, store: &Arc<MockStore>) -> Arc<IncrementalIndexer> {
        let indexer = Arc::new(IncrementalIndexer::new(source.clone(), store.clone(), 1000));
        source.push_idle(&["s0"]);
        indexer.add_account_to_watch(SIGNER).await.unwrap();
        indexer
    }

    #[test]
    fn test_guard_is_exclusive_and_released_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));

        let guard = InFlightGuard::try_acquire(&flag).expect("first acquire");
        assert!(flag.load(Ordering::SeqCst));
        assert!(InFlightGuard::try_acquire(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::SeqCst));
        assert!(InFlightGuard::try_acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn test_guard_is_released_when_holder_panics() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = InFlightGuard::try_acquire(&flag).unwrap();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("pass blew up");
        });
        assert!(handle.await.is_err());
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_tick_while_pass_in_flight_is_skipped() {
        let source = Arc::new(MockSource::new());
        let store = Arc::new(MockStore::new());
        let indexer = watched(&source, &store).await;
        source.push_idle(&["s1"]);

        let gate = source.gate();
        let scheduler = WatchScheduler::new(indexer, Duration::from_secs(60));

        let TickOutcome::Started(first) = scheduler.tick() else {
            panic!("first tick should start a pass");
        };
        assert!(scheduler.is_running());
        assert!(matches!(scheduler.tick(), TickOutcome::Skipped));
        assert!(matches!(scheduler.tick(), TickOutcome::Skipped));

        gate.add_permits(1);
        let report = first.await.unwrap();
        assert_eq!(report, PassReport { addresses: 1, processed: 1, swaps: 0, failures: 0 });
        assert!(!scheduler.is_running());

        // Skipped ticks are not queued; the next tick starts a fresh pass
        source.push("s2", Some(buy_transaction(MINT_A, 10, MINT_B, 20)));
        gate.add_permits(1);
        let TickOutcome::Started(second) = scheduler.tick() else {
            panic!("tick after completion should start a pass");
        };
        let report = second.await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.swaps, 1);
        assert_eq!(store.forward_cursor_history(), vec!["s1", "s2"]);
    }

    #[tokio::test]
    async fn test_guard_is_released_after_failed_pass() {
        let source = Arc::new(MockSource::new());
        let store = Arc::new(MockStore::new());
        let indexer = watched(&source, &store).await;
        source.push_idle(&["s1"]);
        source.fail_fetch("s1");

        let scheduler = WatchScheduler::new(indexer, Duration::from_secs(60));
        let TickOutcome::Started(handle) = scheduler.tick() else {
            panic!("tick should start a pass");
        };
        let report = handle.await.unwrap();
        assert_eq!(report.failures, 1);
        assert!(!scheduler.is_running());

        source.heal("s1");
        let TickOutcome::Started(handle) = scheduler.tick() else {
            panic!("tick should start a pass");
        };
        assert_eq!(handle.await.unwrap().processed, 1);
    }

    #[tokio::test]
    async fn test_failing_address_does_not_block_others() {
        let source = Arc::new(MockSource::new());
        let store = Arc::new(MockStore::new());
        let indexer = watched(&source, &store).await;
        // Shares the mock feed, so a later signature is visible to both addresses
        indexer.add_account_to_watch(OTHER).await.unwrap();
        source.push_idle(&["s1", "s2"]);
        source.fail_fetch("s1");

        let report = run_pass(&indexer, store.as_ref()).await;
        assert_eq!(report.addresses, 2);
        assert_eq!(report.failures, 2);

        source.heal("s1");
        let report = run_pass(&indexer, store.as_ref()).await;
        assert_eq!(report.failures, 0);
        assert_eq!(report.processed, 4);
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_shutdown() {
        let source = Arc::new(MockSource::new());
        let store = Arc::new(MockStore::new());
        let indexer = watched(&source, &store).await;
        source.push_idle(&["s1"]);
        let calls = source.list_calls();

        let shutdown = CancellationToken::new();
        let handle = start_polling(indexer, Duration::from_millis(10), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler should stop")
            .unwrap();

        assert!(source.list_calls() > calls);
        assert_eq!(store.account(SIGNER).unwrap().signature_from.as_deref(), Some("s1"));
    }
}
