pub mod client;
pub mod detector;
pub mod indexer;
pub mod models;
pub mod polling;

// Re-exports for convenience
pub use client::SolanaClient;
pub use detector::detect_swap;
pub use indexer::{IncrementalIndexer, IndexerError, PassSummary};
pub use polling::{start_polling, WatchScheduler};
