use crate::types::TokenAccountView;
use async_trait::async_trait;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::error::Error;

/// Recent blockhash plus the last block height at which a transaction
/// referencing it can still land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Ledger view of a submitted signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// Not yet seen, or seen below the requested commitment
    Pending,
    Confirmed,
    /// Landed with an error
    Failed(String),
}

/// Ledger RPC surface consumed by the SDK.
#[async_trait]
pub trait SolConnection: Send + Sync {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// Token accounts of `owner` holding `mint`, decoded from jsonParsed data.
    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<TokenAccountView>, Box<dyn Error + Send + Sync>>;

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, Box<dyn Error + Send + Sync>>;

    async fn get_latest_blockhash(&self) -> Result<Liveness, Box<dyn Error + Send + Sync>>;

    async fn send_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Signature, Box<dyn Error + Send + Sync>>;

    async fn request_airdrop(
        &self,
        pubkey: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, Box<dyn Error + Send + Sync>>;

    async fn get_signature_state(
        &self,
        signature: &Signature,
    ) -> Result<SignatureState, Box<dyn Error + Send + Sync>>;

    async fn get_block_height(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;
}
