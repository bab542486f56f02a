// Configuration for the swap indexer:
// - RPC endpoint, commitment, timeout, rate limit and retry budget
// - SQLite database location
// - Watch list and scheduler cadence
// - HTTP admin surface and Telegram delivery

use dotenv::dotenv;
use std::env;
use std::time::Duration;

/// Upper bound the RPC accepts for `getSignaturesForAddress`.
pub const MAX_SIGNATURE_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub solana_rpc_url: String,
    pub solana_commitment_level: String,
    pub rpc_timeout_secs: u64,
    pub rpc_rate_limit: Option<u32>,
    pub rpc_max_retries: usize,
    pub poll_interval: Duration,
    pub signature_page_limit: usize,
    pub watch_addresses: Vec<String>,
    pub backfill_on_start: bool,
    pub token_cache_capacity: u64,
    pub notification_queue_size: usize,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:swaps.db".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            solana_rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            solana_commitment_level: "finalized".to_string(),
            rpc_timeout_secs: 30,
            rpc_rate_limit: None,
            rpc_max_retries: 3,
            poll_interval: Duration::from_secs(10),
            signature_page_limit: MAX_SIGNATURE_PAGE_LIMIT,
            watch_addresses: Vec::new(),
            backfill_on_start: false,
            token_cache_capacity: 10_000,
            notification_queue_size: 1000,
            telegram_token: None,
            telegram_chat_id: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let server_host = env::var("SERVER_HOST").unwrap_or(defaults.server_host);
        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.server_port);
        let solana_rpc_url = env::var("SOLANA_RPC_URL").unwrap_or(defaults.solana_rpc_url);
        let solana_commitment_level = env::var("SOLANA_COMMITMENT_LEVEL")
            .unwrap_or(defaults.solana_commitment_level);
        let rpc_timeout_secs = env::var("RPC_TIMEOUT_SECS")
            .map(|v| v.parse().unwrap_or(defaults.rpc_timeout_secs))
            .unwrap_or(defaults.rpc_timeout_secs);
        let rpc_rate_limit = env::var("RPC_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None);
        let rpc_max_retries = env::var("RPC_MAX_RETRIES")
            .map(|v| v.parse().unwrap_or(defaults.rpc_max_retries))
            .unwrap_or(defaults.rpc_max_retries);
        let poll_interval = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);
        let signature_page_limit = env::var("SIGNATURE_PAGE_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.signature_page_limit)
            .clamp(1, MAX_SIGNATURE_PAGE_LIMIT);
        let watch_addresses = env::var("WATCH_ADDRESSES")
            .map(|v| parse_address_list(&v))
            .unwrap_or_default();
        let backfill_on_start = env::var("BACKFILL_ON_START")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.backfill_on_start);
        let token_cache_capacity = env::var("TOKEN_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.token_cache_capacity);
        let notification_queue_size = env::var("NOTIFICATION_QUEUE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|size: &usize| *size > 0)
            .unwrap_or(defaults.notification_queue_size);
        let telegram_token = env::var("TG_TOKEN").ok().filter(|v| !v.is_empty());
        let telegram_chat_id = env::var("CHAT_ID").ok().filter(|v| !v.is_empty());

        Self {
            database_url,
            server_host,
            server_port,
            solana_rpc_url,
            solana_commitment_level,
            rpc_timeout_secs,
            rpc_rate_limit,
            rpc_max_retries,
            poll_interval,
            signature_page_limit,
            watch_addresses,
            backfill_on_start,
            token_cache_capacity,
            notification_queue_size,
            telegram_token,
            telegram_chat_id,
        }
    }
}

/// Split a comma separated address list, dropping blanks and duplicates.
pub fn parse_address_list(raw: &str) -> Vec<String> {
    let mut addresses: Vec<String> = Vec::new();
    for address in raw.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        if !addresses.iter().any(|a| a == address) {
            addresses.push(address.to_string());
        }
    }
    addresses
}
