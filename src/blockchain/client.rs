use crate::blockchain::models::ParsedTransaction;
use crate::config::Config;
use crate::models::{SignatureInfo, TokenMetadata};
use crate::traits::{SignatureQuery, SignatureSource};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::UiTransactionEncoding;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("RPC error: {0}")]
    RpcError(#[from] solana_client::client_error::ClientError),

    #[error("Invalid signature: {0}")]
    SignatureError(String),

    #[error("Invalid public key: {0}")]
    PubkeyError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed transaction {signature}: {reason}")]
    Malformed { signature: String, reason: String },
}

impl ClientError {
    /// Only transport level failures are worth retrying; bad input stays bad.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::RpcError(_))
    }
}

pub struct SolanaClient {
    rpc_client: RpcClient,
    commitment: CommitmentConfig,
    limiter: Option<DefaultDirectRateLimiter>,
    max_retries: usize,
}

impl SolanaClient {
    pub fn new(config: &Config) -> Self {
        let rpc_url = &config.solana_rpc_url;
        let timeout = Duration::from_secs(config.rpc_timeout_secs);

        let commitment = match config.solana_commitment_level.as_str() {
            "processed" => CommitmentConfig::processed(),
            "confirmed" => CommitmentConfig::confirmed(),
            _ => CommitmentConfig::finalized(),
        };

        info!("Initializing Solana client with RPC endpoint: {}, commitment: {:?}", rpc_url, commitment);

        let rpc_client = RpcClient::new_with_timeout_and_commitment(rpc_url.clone(), timeout, commitment);

        let limiter = config
            .rpc_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_second| RateLimiter::direct(Quota::per_second(per_second)));

        Self {
            rpc_client,
            commitment,
            limiter,
            max_retries: config.rpc_max_retries,
        }
    }

    fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(self.max_retries)
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    async fn fetch_signatures(
        &self,
        pubkey: &Pubkey,
        config: GetConfirmedSignaturesForAddress2Config,
    ) -> Result<Vec<SignatureInfo>, ClientError> {
        self.throttle().await;
        let statuses = self
            .rpc_client
            .get_signatures_for_address_with_config(pubkey, config)
            .await?;

        Ok(statuses
            .into_iter()
            .map(|status| SignatureInfo {
                signature: status.signature,
                slot: Some(status.slot),
                block_time: status.block_time,
            })
            .collect())
    }

    async fn fetch_transaction(&self, signature: &Signature) -> Result<ParsedTransaction, ClientError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };

        self.throttle().await;
        let encoded = self.rpc_client.get_transaction_with_config(signature, config).await?;

        ParsedTransaction::from_encoded(&encoded).map_err(|e| ClientError::Malformed {
            signature: signature.to_string(),
            reason: e.to_string(),
        })
    }

    async fn fetch_token_metadata(&self, mint: &Pubkey) -> Result<TokenMetadata, ClientError> {
        self.throttle().await;
        let supply = self.rpc_client.get_token_supply(mint).await?;

        Ok(TokenMetadata {
            address: mint.to_string(),
            name: None,
            symbol: None,
            decimals: Some(supply.decimals),
        })
    }
}

fn parse_pubkey(address: &str) -> Result<Pubkey, ClientError> {
    Pubkey::from_str(address).map_err(|_| ClientError::PubkeyError(address.to_string()))
}

fn parse_signature(signature: &str) -> Result<Signature, ClientError> {
    Signature::from_str(signature).map_err(|_| ClientError::SignatureError(signature.to_string()))
}

fn log_retry(operation: &'static str) -> impl Fn(&ClientError, Duration) {
    move |err, delay| warn!("{} failed, retrying in {:?}: {}", operation, delay, err)
}

#[async_trait]
impl SignatureSource for SolanaClient {
    async fn list_finalized_signatures(
        &self,
        address: &str,
        query: SignatureQuery,
    ) -> Result<Vec<SignatureInfo>, ClientError> {
        let pubkey = parse_pubkey(address)?;
        let before = query.before.as_deref().map(parse_signature).transpose()?;
        let until = query.until.as_deref().map(parse_signature).transpose()?;

        let config = || GetConfirmedSignaturesForAddress2Config {
            before,
            until,
            limit: Some(query.limit),
            commitment: Some(self.commitment),
        };

        let signatures = (|| self.fetch_signatures(&pubkey, config()))
            .retry(self.retry_policy())
            .when(ClientError::is_transient)
            .notify(log_retry("getSignaturesForAddress"))
            .await?;

        debug!("Listed {} signatures for {}", signatures.len(), address);
        Ok(signatures)
    }

    async fn get_parsed_transaction(&self, signature: &str) -> Result<ParsedTransaction, ClientError> {
        let parsed = parse_signature(signature)?;

        (|| self.fetch_transaction(&parsed))
            .retry(self.retry_policy())
            .when(ClientError::is_transient)
            .notify(log_retry("getTransaction"))
            .await
    }

    async fn get_token_metadata(&self, mint: &str) -> Result<TokenMetadata, ClientError> {
        let pubkey = parse_pubkey(mint)?;

        (|| self.fetch_token_metadata(&pubkey))
            .retry(self.retry_policy())
            .when(ClientError::is_transient)
            .notify(log_retry("getTokenSupply"))
            .await
    }
}
