use async_trait::async_trait;
use crate::blockchain::client::ClientError;
use crate::blockchain::models::ParsedTransaction;
use crate::models::{SignatureInfo, TokenMetadata};

/// Bounds for one `getSignaturesForAddress` page. Both bounds are exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureQuery {
    pub limit: usize,
    /// Stop before reaching this (older) signature.
    pub until: Option<String>,
    /// Start after this (newer) signature.
    pub before: Option<String>,
}

/// Paginated, newest-first signature feed plus transaction and mint lookups
#[async_trait]
pub trait SignatureSource: Send + Sync {
    async fn list_finalized_signatures(
        &self,
        address: &str,
        query: SignatureQuery,
    ) -> Result<Vec<SignatureInfo>, ClientError>;

    async fn get_parsed_transaction(&self, signature: &str) -> Result<ParsedTransaction, ClientError>;

    async fn get_token_metadata(&self, mint: &str) -> Result<TokenMetadata, ClientError>;
}
