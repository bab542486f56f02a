// Domain records shared by the indexer, the store and the notification path.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

/// Mints treated as the pricing side of a swap.
pub const QUOTE_MINTS: [&str; 3] = [WRAPPED_SOL_MINT, USDC_MINT, USDT_MINT];

/// Persisted traversal state for one watched address.
///
/// `signature_from` is the newest signature forward discovery has processed and
/// bounds the next listing from below. `signature_to` is the oldest signature
/// backfill has reached and bounds the next backfill page from above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWatch {
    pub address: String,
    pub signature_from: Option<String>,
    pub signature_to: Option<String>,
    pub backfill_complete: bool,
    pub added_at: i64,
}

/// Partial cursor update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorUpdate {
    pub signature_from: Option<String>,
    pub signature_to: Option<String>,
    pub backfill_complete: Option<bool>,
}

impl CursorUpdate {
    pub fn forward(signature: &str) -> Self {
        Self {
            signature_from: Some(signature.to_string()),
            ..Self::default()
        }
    }

    pub fn backward(signature: &str) -> Self {
        Self {
            signature_to: Some(signature.to_string()),
            ..Self::default()
        }
    }

    pub fn backfill_finished() -> Self {
        Self {
            backfill_complete: Some(true),
            ..Self::default()
        }
    }
}

/// One side of a swap. `amount` is the absolute raw (undecimalized) delta.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
    pub mint: String,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
    pub signature: String,
    pub account: String,
    pub token_in: TokenAmount,
    pub token_out: TokenAmount,
    pub block_time: Option<i64>,
}

impl SwapRecord {
    /// The non-quote side of the swap: what the account bought or sold.
    pub fn traded_mint(&self) -> &str {
        let in_is_quote = QUOTE_MINTS.contains(&self.token_in.mint.as_str());
        let out_is_quote = QUOTE_MINTS.contains(&self.token_out.mint.as_str());
        match (in_is_quote, out_is_quote) {
            (true, false) => &self.token_out.mint,
            _ => &self.token_in.mint,
        }
    }

    pub fn mints(&self) -> [&str; 2] {
        [&self.token_in.mint, &self.token_out.mint]
    }
}

/// One entry of a `getSignaturesForAddress` page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: Option<u64>,
    pub block_time: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
}

impl TokenMetadata {
    pub fn unknown(mint: &str) -> Self {
        Self {
            address: mint.to_string(),
            ..Self::default()
        }
    }

    /// Symbol when known, otherwise a shortened mint.
    pub fn label(&self) -> String {
        match &self.symbol {
            Some(symbol) if !symbol.is_empty() => symbol.clone(),
            _ => short_address(&self.address),
        }
    }
}

/// History and metadata handed to a dispatcher alongside a detected swap.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SwapContext {
    pub swaps: Vec<SwapRecord>,
    pub tokens: HashMap<String, TokenMetadata>,
}

/// A detected swap queued for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapEvent {
    pub address: String,
    pub swap: SwapRecord,
}

pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}..{}", head, tail)
}

/// Raw token amounts travel as decimal strings so values above 2^53 survive JSON.
pub mod amount_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swap(token_in: &str, token_out: &str) -> SwapRecord {
        SwapRecord {
            signature: "sig".to_string(),
            account: "acct".to_string(),
            token_in: TokenAmount { mint: token_in.to_string(), amount: 1 },
            token_out: TokenAmount { mint: token_out.to_string(), amount: 2 },
            block_time: None,
        }
    }

    #[test]
    fn traded_mint_skips_quote_side() {
        assert_eq!(swap(WRAPPED_SOL_MINT, "BONK").traded_mint(), "BONK");
        assert_eq!(swap("BONK", USDC_MINT).traded_mint(), "BONK");
        assert_eq!(swap("A", "B").traded_mint(), "A");
    }

    #[test]
    fn amounts_serialize_as_strings() {
        let amount = TokenAmount { mint: "M".to_string(), amount: u128::from(u64::MAX) + 7 };
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, r#"{"mint":"M","amount":"18446744073709551622"}"#);
        let back: TokenAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn label_falls_back_to_short_mint() {
        let meta = TokenMetadata::unknown(WRAPPED_SOL_MINT);
        assert_eq!(meta.label(), "So11..1112");
    }

    #[test]
    fn short_address_counts_characters() {
        assert_eq!(short_address("short"), "short");
        assert_eq!(short_address("ééééé-ünïcødé-ßßßß"), "éééé..ßßßß");
        assert_eq!(short_address("ab€defghijk"), "ab€d..hijk");
    }
}
