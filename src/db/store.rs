use crate::db::{account, swap, token, StoreError};
use crate::models::{AccountWatch, CursorUpdate, SwapRecord, TokenMetadata};
use crate::traits::CursorStore;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// SQLite backed [`CursorStore`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CursorStore for SqliteStore {
    async fn seed_account(&self, address: &str, signature: &str) -> Result<AccountWatch, StoreError> {
        Ok(account::seed_account(&self.pool, address, signature).await?)
    }

    async fn get_account_cursors(&self, address: &str) -> Result<Option<AccountWatch>, StoreError> {
        Ok(account::get_account(&self.pool, address).await?)
    }

    async fn set_account_cursors(&self, address: &str, update: CursorUpdate) -> Result<(), StoreError> {
        Ok(account::update_cursors(&self.pool, address, &update).await?)
    }

    async fn list_watched_accounts(&self) -> Result<Vec<String>, StoreError> {
        Ok(account::get_all_watched_addresses(&self.pool).await?)
    }

    async fn remove_account(&self, address: &str) -> Result<bool, StoreError> {
        Ok(account::remove_account(&self.pool, address).await?)
    }

    async fn put_swap_record(&self, record: &SwapRecord) -> Result<(), StoreError> {
        Ok(swap::put_swap(&self.pool, record).await?)
    }

    async fn get_swap_history(&self, address: &str, mint: &str) -> Result<Vec<SwapRecord>, StoreError> {
        swap::get_account_token_swaps(&self.pool, address, mint).await
    }

    async fn get_token_metadata_batch(&self, mints: &[String]) -> Result<Vec<TokenMetadata>, StoreError> {
        Ok(token::get_tokens_metadata(&self.pool, mints).await?)
    }

    async fn put_token_metadata(&self, metadata: &TokenMetadata) -> Result<(), StoreError> {
        Ok(token::put_token_metadata(&self.pool, metadata).await?)
    }
}
