//! In-memory collaborators and transaction builders for tests

use crate::blockchain::client::ClientError;
use crate::blockchain::models::{
    AccountKey, ParsedMessage, ParsedTransaction, RawTokenAmount, TokenBalanceEntry, TransactionBody,
    TransactionMeta,
};
use crate::db::StoreError;
use crate::models::{AccountWatch, CursorUpdate, SignatureInfo, SwapContext, SwapRecord, TokenMetadata};
use crate::notifications::NotifyError;
use crate::traits::{CursorStore, NotificationDispatcher, SignatureQuery, SignatureSource};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub const SIGNER: &str = "Signer1111111111111111111111111111111111111";
pub const POOL: &str = "Pool11111111111111111111111111111111111111";
pub const MINT_A: &str = "MintA111111111111111111111111111111111111";
pub const MINT_B: &str = "MintB111111111111111111111111111111111111";
pub const MINT_C: &str = "MintC111111111111111111111111111111111111";

pub fn balance(account_index: u32, owner: &str, mint: &str, amount: &str) -> TokenBalanceEntry {
    TokenBalanceEntry {
        account_index,
        mint: mint.to_string(),
        owner: Some(owner.to_string()),
        ui_token_amount: RawTokenAmount {
            amount: amount.to_string(),
            decimals: Some(6),
        },
    }
}

pub fn transaction(
    signer: &str,
    pre: Vec<TokenBalanceEntry>,
    post: Vec<TokenBalanceEntry>,
) -> ParsedTransaction {
    ParsedTransaction {
        slot: Some(1),
        block_time: Some(1_700_000_000),
        transaction: TransactionBody {
            signatures: Vec::new(),
            message: ParsedMessage {
                account_keys: vec![
                    AccountKey {
                        pubkey: signer.to_string(),
                        signer: true,
                        writable: true,
                    },
                    AccountKey {
                        pubkey: POOL.to_string(),
                        signer: false,
                        writable: true,
                    },
                ],
            },
        },
        meta: Some(TransactionMeta {
            pre_token_balances: Some(pre),
            post_token_balances: Some(post),
        }),
    }
}

/// Signer receives `bought` of `bought_mint` from the pool and the pool receives
/// `paid` of `paid_mint`.
pub fn buy_transaction(bought_mint: &str, bought: u64, paid_mint: &str, paid: u64) -> ParsedTransaction {
    transaction(
        SIGNER,
        vec![
            balance(1, SIGNER, bought_mint, "0"),
            balance(2, POOL, bought_mint, "1000000"),
            balance(3, POOL, paid_mint, "1000000"),
        ],
        vec![
            balance(1, SIGNER, bought_mint, &bought.to_string()),
            balance(2, POOL, bought_mint, &(1_000_000 - bought).to_string()),
            balance(3, POOL, paid_mint, &(1_000_000 + paid).to_string()),
        ],
    )
}

/// A plain transfer-like transaction with no token movement.
pub fn idle_transaction() -> ParsedTransaction {
    transaction(SIGNER, Vec::new(), Vec::new())
}

#[derive(Default)]
pub struct MockSource {
    /// Oldest first.
    history: Mutex<Vec<String>>,
    transactions: Mutex<HashMap<String, ParsedTransaction>>,
    failing: Mutex<HashSet<String>>,
    metadata: Mutex<HashMap<String, TokenMetadata>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    pub list_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub fetched: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a signature to the feed; `None` means an idle transaction.
    pub fn push(&self, signature: &str, tx: Option<ParsedTransaction>) {
        self.history.lock().unwrap().push(signature.to_string());
        self.transactions
            .lock()
            .unwrap()
            .insert(signature.to_string(), tx.unwrap_or_else(idle_transaction));
    }

    pub fn push_idle(&self, signatures: &[&str]) {
        for signature in signatures {
            self.push(signature, None);
        }
    }

    pub fn fail_fetch(&self, signature: &str) {
        self.failing.lock().unwrap().insert(signature.to_string());
    }

    pub fn heal(&self, signature: &str) {
        self.failing.lock().unwrap().remove(signature);
    }

    pub fn set_metadata(&self, metadata: TokenMetadata) {
        self.metadata.lock().unwrap().insert(metadata.address.clone(), metadata);
    }

    /// Block every listing until a permit is added to the returned semaphore.
    pub fn gate(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignatureSource for MockSource {
    async fn list_finalized_signatures(
        &self,
        _address: &str,
        query: SignatureQuery,
    ) -> Result<Vec<SignatureInfo>, ClientError> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let chain = self.history.lock().unwrap().clone();
        let position = |signature: &String| chain.iter().position(|s| s == signature);
        let upper = query.before.as_ref().and_then(position).unwrap_or(chain.len());
        let lower = query.until.as_ref().and_then(position).map(|i| i + 1).unwrap_or(0);
        if lower >= upper {
            return Ok(Vec::new());
        }

        Ok(chain[lower..upper]
            .iter()
            .rev()
            .take(query.limit)
            .map(|signature| SignatureInfo {
                signature: signature.clone(),
                slot: None,
                block_time: None,
            })
            .collect())
    }

    async fn get_parsed_transaction(&self, signature: &str) -> Result<ParsedTransaction, ClientError> {
        if self.failing.lock().unwrap().contains(signature) {
            return Err(ClientError::NotFound(signature.to_string()));
        }
        self.fetched.lock().unwrap().push(signature.to_string());

        self.transactions
            .lock()
            .unwrap()
            .get(signature)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(signature.to_string()))
    }

    async fn get_token_metadata(&self, mint: &str) -> Result<TokenMetadata, ClientError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata
            .lock()
            .unwrap()
            .get(mint)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(mint.to_string()))
    }
}

#[derive(Default)]
pub struct MockStore {
    accounts: Mutex<BTreeMap<String, AccountWatch>>,
    swaps: Mutex<BTreeMap<String, SwapRecord>>,
    metadata: Mutex<HashMap<String, TokenMetadata>>,
    pub cursor_log: Mutex<Vec<CursorUpdate>>,
    pub swap_writes: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, address: &str) -> Option<AccountWatch> {
        self.accounts.lock().unwrap().get(address).cloned()
    }

    pub fn swaps(&self) -> Vec<SwapRecord> {
        self.swaps.lock().unwrap().values().cloned().collect()
    }

    pub fn cursor_log(&self) -> Vec<CursorUpdate> {
        self.cursor_log.lock().unwrap().clone()
    }

    pub fn forward_cursor_history(&self) -> Vec<String> {
        self.cursor_log()
            .into_iter()
            .filter_map(|update| update.signature_from)
            .collect()
    }

    pub fn backward_cursor_history(&self) -> Vec<String> {
        self.cursor_log()
            .into_iter()
            .filter_map(|update| update.signature_to)
            .collect()
    }
}

#[async_trait]
impl CursorStore for MockStore {
    async fn seed_account(&self, address: &str, signature: &str) -> Result<AccountWatch, StoreError> {
        let watch = AccountWatch {
            address: address.to_string(),
            signature_from: Some(signature.to_string()),
            signature_to: Some(signature.to_string()),
            backfill_complete: false,
            added_at: 0,
        };
        self.accounts.lock().unwrap().insert(address.to_string(), watch.clone());
        Ok(watch)
    }

    async fn get_account_cursors(&self, address: &str) -> Result<Option<AccountWatch>, StoreError> {
        Ok(self.account(address))
    }

    async fn set_account_cursors(&self, address: &str, update: CursorUpdate) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(watch) = accounts.get_mut(address) {
            if let Some(from) = &update.signature_from {
                watch.signature_from = Some(from.clone());
            }
            if let Some(to) = &update.signature_to {
                watch.signature_to = Some(to.clone());
            }
            if let Some(done) = update.backfill_complete {
                watch.backfill_complete = done;
            }
        }
        self.cursor_log.lock().unwrap().push(update);
        Ok(())
    }

    async fn list_watched_accounts(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.accounts.lock().unwrap().keys().cloned().collect())
    }

    async fn remove_account(&self, address: &str) -> Result<bool, StoreError> {
        Ok(self.accounts.lock().unwrap().remove(address).is_some())
    }

    async fn put_swap_record(&self, record: &SwapRecord) -> Result<(), StoreError> {
        self.swap_writes.fetch_add(1, Ordering::SeqCst);
        self.swaps
            .lock()
            .unwrap()
            .insert(record.signature.clone(), record.clone());
        Ok(())
    }

    async fn get_swap_history(&self, address: &str, mint: &str) -> Result<Vec<SwapRecord>, StoreError> {
        Ok(self
            .swaps()
            .into_iter()
            .filter(|swap| swap.account == address)
            .filter(|swap| swap.token_in.mint == mint || swap.token_out.mint == mint)
            .collect())
    }

    async fn get_token_metadata_batch(&self, mints: &[String]) -> Result<Vec<TokenMetadata>, StoreError> {
        let metadata = self.metadata.lock().unwrap();
        Ok(mints.iter().filter_map(|mint| metadata.get(mint).cloned()).collect())
    }

    async fn put_token_metadata(&self, metadata: &TokenMetadata) -> Result<(), StoreError> {
        self.metadata
            .lock()
            .unwrap()
            .insert(metadata.address.clone(), metadata.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDispatcher {
    pub fail: bool,
    pub delivered: Mutex<Vec<(String, SwapRecord, SwapContext)>>,
}

impl RecordingDispatcher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<(String, SwapRecord, SwapContext)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        address: &str,
        swap: &SwapRecord,
        context: &SwapContext,
    ) -> Result<(), NotifyError> {
        self.delivered
            .lock()
            .unwrap()
            .push((address.to_string(), swap.clone(), context.clone()));
        if self.fail {
            return Err(NotifyError::Status {
                status: 500,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}
