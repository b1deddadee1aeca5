use crate::session::AddressCache;
use crate::types::LockupEntry;
use crate::utils;
use log::debug;
use reqwest::{Client, StatusCode};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockupError {
    /// No cached wallet address to look up
    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Invalid cached address: {0}")]
    InvalidAddress(String),

    /// Backend has no lockup schedule for this wallet
    #[error("No lockup information for {0}")]
    NotFound(Pubkey),

    #[error("Lockup request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Client for the lockup schedule backend (`GET /api/lockups/{address}`)
pub struct LockupClient {
    client: Client,
    base_url: String,
}

impl LockupClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn lockups_url(&self, owner: &Pubkey) -> String {
        format!(
            "{}/api/lockups/{}",
            self.base_url.trim_end_matches('/'),
            owner
        )
    }

    pub async fn fetch(&self, owner: &Pubkey) -> Result<Vec<LockupEntry>, LockupError> {
        let url = self.lockups_url(owner);
        debug!("fetching lockups from {}", url);

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(LockupError::NotFound(*owner));
        }
        Ok(response.error_for_status()?.json().await?)
    }

    /// Lockups for the address remembered by the last connect
    pub async fn fetch_cached(&self, cache: &AddressCache) -> Result<Vec<LockupEntry>, LockupError> {
        let cached = cache.get().ok_or(LockupError::NotConnected)?;
        let owner =
            utils::parse_address(&cached).map_err(|e| LockupError::InvalidAddress(e.to_string()))?;
        self.fetch(&owner).await
    }
}
