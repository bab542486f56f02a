// Swap detection from token balance snapshots.
//
// A transaction counts as a swap when the signer's net token change touches
// exactly one mint and the other owners' net change touches exactly two mints,
// one of which is the signer's. Multi-hop and multi-asset shapes are ignored.

use crate::blockchain::models::{ParsedTransaction, TokenBalanceEntry};
use crate::models::{SwapRecord, TokenAmount};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error("Transaction has no signer in its account keys")]
    MissingSigner,

    #[error("Invalid token amount {amount:?} at account index {account_index}")]
    InvalidAmount { account_index: u32, amount: String },

    #[error("Balance arithmetic overflow for mint {0}")]
    Overflow(String),
}

/// Balance movement of one token account inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalanceDelta {
    pub account_index: u32,
    pub mint: String,
    pub owner: Option<String>,
    pub pre_amount: u128,
    pub post_amount: u128,
    pub change: i128,
    pub is_signer: bool,
}

/// Net change per mint, split by whether the signer owns the token account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceChanges {
    pub signer: String,
    pub signer_changes: BTreeMap<String, i128>,
    pub counterparty_changes: BTreeMap<String, i128>,
}

impl BalanceChanges {
    fn non_zero(changes: &BTreeMap<String, i128>) -> Vec<(&str, i128)> {
        changes
            .iter()
            .filter(|(_, change)| **change != 0)
            .map(|(mint, change)| (mint.as_str(), *change))
            .collect()
    }

    pub fn signer_mints(&self) -> Vec<(&str, i128)> {
        Self::non_zero(&self.signer_changes)
    }

    pub fn counterparty_mints(&self) -> Vec<(&str, i128)> {
        Self::non_zero(&self.counterparty_changes)
    }
}

#[derive(Default)]
struct BalanceRow {
    mint: String,
    owner: Option<String>,
    pre_amount: u128,
    post_amount: u128,
}

fn parse_amount(entry: &TokenBalanceEntry) -> Result<u128, DetectError> {
    let raw = entry.ui_token_amount.amount.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|_| DetectError::InvalidAmount {
        account_index: entry.account_index,
        amount: raw.to_string(),
    })
}

/// Merge pre and post snapshots per account index; a missing side counts as zero.
pub fn token_balance_deltas(tx: &ParsedTransaction) -> Result<Vec<TokenBalanceDelta>, DetectError> {
    let signer = tx.signer().ok_or(DetectError::MissingSigner)?;
    let mut rows: BTreeMap<u32, BalanceRow> = BTreeMap::new();

    for entry in tx.pre_token_balances() {
        let row = rows.entry(entry.account_index).or_default();
        row.mint = entry.mint.clone();
        row.owner = entry.owner.clone();
        row.pre_amount = parse_amount(entry)?;
    }

    for entry in tx.post_token_balances() {
        let post_amount = parse_amount(entry)?;
        let row = rows.entry(entry.account_index).or_insert_with(|| BalanceRow {
            mint: entry.mint.clone(),
            owner: entry.owner.clone(),
            ..BalanceRow::default()
        });
        row.post_amount = post_amount;
    }

    rows.into_iter()
        .map(|(account_index, row)| {
            let overflow = || DetectError::Overflow(row.mint.clone());
            let pre = i128::try_from(row.pre_amount).map_err(|_| overflow())?;
            let post = i128::try_from(row.post_amount).map_err(|_| overflow())?;
            let change = post.checked_sub(pre).ok_or_else(overflow)?;
            let is_signer = row.owner.as_deref() == Some(signer);
            Ok(TokenBalanceDelta {
                account_index,
                mint: row.mint,
                owner: row.owner,
                pre_amount: row.pre_amount,
                post_amount: row.post_amount,
                change,
                is_signer,
            })
        })
        .collect()
}

pub fn balance_changes(tx: &ParsedTransaction) -> Result<BalanceChanges, DetectError> {
    let signer = tx.signer().ok_or(DetectError::MissingSigner)?.to_string();
    let mut changes = BalanceChanges {
        signer,
        ..BalanceChanges::default()
    };

    for delta in token_balance_deltas(tx)? {
        let side = if delta.is_signer {
            &mut changes.signer_changes
        } else {
            &mut changes.counterparty_changes
        };
        let total = side.entry(delta.mint.clone()).or_insert(0);
        *total = total
            .checked_add(delta.change)
            .ok_or(DetectError::Overflow(delta.mint))?;
    }

    Ok(changes)
}

/// Classify `tx` as a two-sided swap. `Ok(None)` is the normal outcome for
/// anything that is not a simple A to B swap.
pub fn detect_swap(signature: &str, tx: &ParsedTransaction) -> Result<Option<SwapRecord>, DetectError> {
    let changes = balance_changes(tx)?;
    let signer_mints = changes.signer_mints();
    let counterparty_mints = changes.counterparty_mints();

    if signer_mints.len() != 1 || counterparty_mints.len() != 2 {
        return Ok(None);
    }

    let (signer_mint, signer_change) = signer_mints[0];
    let other_side: Vec<(&str, i128)> = counterparty_mints
        .iter()
        .copied()
        .filter(|(mint, _)| *mint != signer_mint)
        .collect();

    let [(other_mint, other_change)] = other_side[..] else {
        debug!(
            "Ambiguous swap shape in {}: signer mint {} not among counterparty mints",
            signature, signer_mint
        );
        return Ok(None);
    };

    let signer_side = TokenAmount {
        mint: signer_mint.to_string(),
        amount: signer_change.unsigned_abs(),
    };
    let counter_side = TokenAmount {
        mint: other_mint.to_string(),
        amount: other_change.unsigned_abs(),
    };

    let (token_in, token_out) = if signer_change > 0 {
        (signer_side, counter_side)
    } else {
        (counter_side, signer_side)
    };

    Ok(Some(SwapRecord {
        signature: signature.to_string(),
        account: changes.signer,
        token_in,
        token_out,
        block_time: tx.block_time,
    }))
}
