pub mod api;
pub mod blockchain;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod notifications;
pub mod state;
pub mod traits;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::error::ApiError;
pub use api::route::{create_router, SwapsQuery, TrackQuery};
pub use blockchain::{detect_swap, IncrementalIndexer, IndexerError, SolanaClient, WatchScheduler};
pub use db::SqliteStore;
pub use models::{AccountWatch, SwapRecord, TokenAmount};
pub use validation::{validate_action, validate_address_action, validate_solana_address};
