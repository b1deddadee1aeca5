use crate::core::constants::*;
use crate::utils;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

/// Raw settings as loaded from defaults, an optional file and `SNAX_*` env vars
#[derive(Debug, Clone, Deserialize)]
pub struct SdkConfig {
    pub rpc_url: String,
    /// Base58 mint of the token being transferred
    pub token_mint: String,
    pub token_decimals: u8,
    pub token_symbol: String,
    pub price_url: String,
    pub lockup_api_url: String,
    pub airdrop_lamports: u64,
    pub poll_interval_ms: u64,
    pub refresh_delay_ms: u64,
    pub connect_retry_delay_ms: u64,
}

/// Typed settings consumed by the orchestrator, refresher and resolver
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub mint: Pubkey,
    pub decimals: u8,
    pub symbol: String,
    pub airdrop_lamports: u64,
    pub poll_interval: Duration,
    pub refresh_delay: Duration,
    pub connect_retry_delay: Duration,
}

impl TransferConfig {
    pub fn new(mint: Pubkey, decimals: u8) -> Self {
        Self {
            mint,
            decimals,
            symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            airdrop_lamports: DEFAULT_AIRDROP_LAMPORTS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            refresh_delay: Duration::from_millis(DEFAULT_REFRESH_DELAY_MS),
            connect_retry_delay: Duration::from_millis(DEFAULT_CONNECT_RETRY_DELAY_MS),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn with_connect_retry_delay(mut self, delay: Duration) -> Self {
        self.connect_retry_delay = delay;
        self
    }
}

/// Load settings. `path` names an optional config file (any format the
/// `config` crate understands); environment variables override it.
pub fn load_config(path: Option<&str>) -> Result<SdkConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("rpc_url", DEVNET_RPC_URL)?
        .set_default("token_decimals", DEFAULT_TOKEN_DECIMALS as i64)?
        .set_default("token_symbol", DEFAULT_TOKEN_SYMBOL)?
        .set_default("price_url", DEFAULT_PRICE_URL)?
        .set_default("lockup_api_url", DEFAULT_LOCKUP_API_URL)?
        .set_default("airdrop_lamports", DEFAULT_AIRDROP_LAMPORTS as i64)?
        .set_default("poll_interval_ms", DEFAULT_POLL_INTERVAL_MS as i64)?
        .set_default("refresh_delay_ms", DEFAULT_REFRESH_DELAY_MS as i64)?
        .set_default("connect_retry_delay_ms", DEFAULT_CONNECT_RETRY_DELAY_MS as i64)?;

    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path).required(false));
    }

    builder
        .add_source(Environment::with_prefix("SNAX"))
        .build()?
        .try_deserialize()
}

impl SdkConfig {
    pub fn transfer_config(&self) -> Result<TransferConfig, ConfigError> {
        let mint = utils::parse_address(&self.token_mint)
            .map_err(|e| ConfigError::Message(format!("token_mint: {}", e)))?;

        Ok(TransferConfig {
            mint,
            decimals: self.token_decimals,
            symbol: self.token_symbol.clone(),
            airdrop_lamports: self.airdrop_lamports,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            refresh_delay: Duration::from_millis(self.refresh_delay_ms),
            connect_retry_delay: Duration::from_millis(self.connect_retry_delay_ms),
        })
    }
}
