use crate::config::TransferConfig;
use crate::core::connection::SolConnection;
use crate::error::{ledger_error, Result};
use crate::types::{BalanceSnapshot, TokenAccountView};
use crate::utils;
use log::{debug, info};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::sync::Arc;

/// Read-only projection of ledger state for one token mint.
pub struct BalanceRefresher<C> {
    connection: Arc<C>,
    mint: Pubkey,
    decimals: u8,
    airdrop_lamports: u64,
}

impl<C> Clone for BalanceRefresher<C> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            mint: self.mint,
            decimals: self.decimals,
            airdrop_lamports: self.airdrop_lamports,
        }
    }
}

impl<C: SolConnection> BalanceRefresher<C> {
    pub fn new(connection: Arc<C>, config: &TransferConfig) -> Self {
        Self {
            connection,
            mint: config.mint,
            decimals: config.decimals,
            airdrop_lamports: config.airdrop_lamports,
        }
    }

    pub fn mint(&self) -> Pubkey {
        self.mint
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Native balance in lamports
    pub async fn native_balance(&self, owner: &Pubkey) -> Result<u64> {
        self.connection
            .get_balance(owner)
            .await
            .map_err(ledger_error)
    }

    /// The owner's token account for the configured mint, if any.
    ///
    /// Prefers the associated account; otherwise the largest holding.
    pub async fn resolve_token_account(&self, owner: &Pubkey) -> Result<Option<TokenAccountView>> {
        let accounts = self
            .connection
            .get_token_accounts_by_owner(owner, &self.mint)
            .await
            .map_err(ledger_error)?;

        let associated = utils::derive_token_account(owner, &self.mint);
        let chosen = match accounts.iter().position(|a| a.address == associated) {
            Some(idx) => accounts.into_iter().nth(idx),
            None => accounts.into_iter().max_by_key(|a| a.raw_amount),
        };
        Ok(chosen)
    }

    /// Token balance for display; a missing account reads as zero.
    pub async fn token_balance(&self, owner: &Pubkey) -> Result<TokenAccountView> {
        match self.resolve_token_account(owner).await? {
            Some(view) => Ok(view),
            None => {
                debug!("no {} token account for {}, showing zero", self.mint, owner);
                Ok(TokenAccountView::empty(*owner, self.mint, self.decimals))
            },
        }
    }

    pub async fn refresh(&self, owner: &Pubkey) -> Result<BalanceSnapshot> {
        let (native_lamports, token) =
            tokio::try_join!(self.native_balance(owner), self.token_balance(owner))?;
        Ok(BalanceSnapshot {
            native_lamports,
            token,
        })
    }

    /// Ask the network faucet for test SOL
    pub async fn request_test_funds(&self, owner: &Pubkey) -> Result<Signature> {
        info!("requesting {} lamports airdrop for {}", self.airdrop_lamports, owner);
        self.connection
            .request_airdrop(owner, self.airdrop_lamports)
            .await
            .map_err(ledger_error)
    }
}
