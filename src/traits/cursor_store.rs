use async_trait::async_trait;
use crate::db::StoreError;
use crate::models::{AccountWatch, CursorUpdate, SwapRecord, TokenMetadata};

/// Persistence for per-account cursors, detected swaps and token metadata
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Register `address` with both cursors at `signature`, discarding prior progress.
    async fn seed_account(&self, address: &str, signature: &str) -> Result<AccountWatch, StoreError>;

    async fn get_account_cursors(&self, address: &str) -> Result<Option<AccountWatch>, StoreError>;

    /// Merge the provided fields into the stored cursor record.
    async fn set_account_cursors(&self, address: &str, update: CursorUpdate) -> Result<(), StoreError>;

    async fn list_watched_accounts(&self) -> Result<Vec<String>, StoreError>;

    async fn remove_account(&self, address: &str) -> Result<bool, StoreError>;

    /// Idempotent upsert keyed by signature.
    async fn put_swap_record(&self, record: &SwapRecord) -> Result<(), StoreError>;

    /// Swaps by `address` where `mint` was either side, oldest first.
    async fn get_swap_history(&self, address: &str, mint: &str) -> Result<Vec<SwapRecord>, StoreError>;

    async fn get_token_metadata_batch(&self, mints: &[String]) -> Result<Vec<TokenMetadata>, StoreError>;

    async fn put_token_metadata(&self, metadata: &TokenMetadata) -> Result<(), StoreError>;
}
