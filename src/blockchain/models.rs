// Typed view of a `jsonParsed` transaction, limited to what swap detection reads.
// Built from the RPC's encoded form by going through its JSON representation, so
// the field names below follow the RPC wire format.

use serde::{Deserialize, Serialize};
use solana_transaction_status::EncodedConfirmedTransactionWithStatusMeta;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub block_time: Option<i64>,
    pub transaction: TransactionBody,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBody {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: ParsedMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMessage {
    #[serde(default)]
    pub account_keys: Vec<AccountKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKey {
    pub pubkey: String,
    #[serde(default)]
    pub signer: bool,
    #[serde(default)]
    pub writable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub pre_token_balances: Option<Vec<TokenBalanceEntry>>,
    #[serde(default)]
    pub post_token_balances: Option<Vec<TokenBalanceEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceEntry {
    pub account_index: u32,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ui_token_amount: RawTokenAmount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenAmount {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub decimals: Option<u8>,
}

impl ParsedTransaction {
    /// Decode the RPC response. Fails when the message is not in parsed form.
    pub fn from_encoded(
        encoded: &EncodedConfirmedTransactionWithStatusMeta,
    ) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(encoded)?;
        serde_json::from_value(value)
    }

    /// First account flagged as signer, i.e. the fee payer.
    pub fn signer(&self) -> Option<&str> {
        self.transaction
            .message
            .account_keys
            .iter()
            .find(|key| key.signer)
            .map(|key| key.pubkey.as_str())
    }

    pub fn pre_token_balances(&self) -> &[TokenBalanceEntry] {
        self.meta
            .as_ref()
            .and_then(|meta| meta.pre_token_balances.as_deref())
            .unwrap_or_default()
    }

    pub fn post_token_balances(&self) -> &[TokenBalanceEntry] {
        self.meta
            .as_ref()
            .and_then(|meta| meta.post_token_balances.as_deref())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rpc_json_shape() {
        let raw = serde_json::json!({
            "slot": 42,
            "blockTime": 1700000000,
            "transaction": {
                "signatures": ["sig"],
                "message": {
                    "accountKeys": [
                        {"pubkey": "S", "signer": true, "writable": true, "source": "transaction"},
                        {"pubkey": "P", "signer": false, "writable": true, "source": "transaction"}
                    ],
                    "instructions": [],
                    "recentBlockhash": "hash"
                }
            },
            "meta": {
                "err": null,
                "fee": 5000,
                "preTokenBalances": [{
                    "accountIndex": 1,
                    "mint": "A",
                    "owner": "S",
                    "programId": "Tokenkeg",
                    "uiTokenAmount": {"amount": "500", "decimals": 6, "uiAmount": 0.0005, "uiAmountString": "0.0005"}
                }]
            }
        });

        let tx: ParsedTransaction = serde_json::from_value(raw).unwrap();
        assert_eq!(tx.signer(), Some("S"));
        assert_eq!(tx.block_time, Some(1700000000));
        assert_eq!(tx.pre_token_balances().len(), 1);
        assert_eq!(tx.pre_token_balances()[0].ui_token_amount.amount, "500");
        assert!(tx.post_token_balances().is_empty());
    }

    #[test]
    fn missing_meta_reads_as_empty_balances() {
        let raw = serde_json::json!({
            "transaction": {"message": {"accountKeys": []}},
            "meta": null
        });
        let tx: ParsedTransaction = serde_json::from_value(raw).unwrap();
        assert!(tx.pre_token_balances().is_empty());
        assert!(tx.post_token_balances().is_empty());
        assert_eq!(tx.signer(), None);
    }
}
