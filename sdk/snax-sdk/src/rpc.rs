use crate::core::connection::{Liveness, SignatureState, SolConnection};
use crate::types::TokenAccountView;
use async_trait::async_trait;
use solana_account_decoder::UiAccountData;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::error::Error;
use std::str::FromStr;

/// [`SolConnection`] over a JSON-RPC node
pub struct RpcConnection {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcConnection {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_commitment(url, CommitmentConfig::confirmed())
    }

    pub fn with_commitment(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.into(), commitment),
            commitment,
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

/// Pull `info.tokenAmount.{amount,decimals}` out of a jsonParsed token account
fn parse_token_account(
    address: &str,
    owner: &Pubkey,
    mint: &Pubkey,
    data: &UiAccountData,
) -> Result<TokenAccountView, Box<dyn Error + Send + Sync>> {
    let UiAccountData::Json(parsed) = data else {
        return Err(format!("token account {} was not jsonParsed", address).into());
    };
    let token_amount = &parsed.parsed["info"]["tokenAmount"];
    let raw_amount = token_amount["amount"]
        .as_str()
        .ok_or("missing tokenAmount.amount")?
        .parse::<u64>()?;
    let decimals = token_amount["decimals"]
        .as_u64()
        .ok_or("missing tokenAmount.decimals")?;

    Ok(TokenAccountView {
        address: Pubkey::from_str(address)?,
        owner: *owner,
        mint: *mint,
        raw_amount,
        decimals: u8::try_from(decimals)?,
    })
}

#[async_trait]
impl SolConnection for RpcConnection {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, Box<dyn Error + Send + Sync>> {
        Ok(self.client.get_balance(pubkey).await?)
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<TokenAccountView>, Box<dyn Error + Send + Sync>> {
        let keyed = self
            .client
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::Mint(*mint))
            .await?;

        keyed
            .iter()
            .map(|k| parse_token_account(&k.pubkey, owner, mint, &k.account.data))
            .collect()
    }

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, Box<dyn Error + Send + Sync>> {
        Ok(self
            .client
            .get_account_with_commitment(pubkey, self.commitment)
            .await?
            .value)
    }

    async fn get_latest_blockhash(&self) -> Result<Liveness, Box<dyn Error + Send + Sync>> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;
        Ok(Liveness {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn send_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Signature, Box<dyn Error + Send + Sync>> {
        Ok(self.client.send_transaction(tx).await?)
    }

    async fn request_airdrop(
        &self,
        pubkey: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, Box<dyn Error + Send + Sync>> {
        Ok(self.client.request_airdrop(pubkey, lamports).await?)
    }

    async fn get_signature_state(
        &self,
        signature: &Signature,
    ) -> Result<SignatureState, Box<dyn Error + Send + Sync>> {
        let statuses = self
            .client
            .get_signature_statuses(&[*signature])
            .await?
            .value;

        let state = match statuses.into_iter().next().flatten() {
            None => SignatureState::Pending,
            Some(status) => match status.err {
                Some(err) => SignatureState::Failed(err.to_string()),
                None if status.satisfies_commitment(self.commitment) => SignatureState::Confirmed,
                None => SignatureState::Pending,
            },
        };
        Ok(state)
    }

    async fn get_block_height(&self) -> Result<u64, Box<dyn Error + Send + Sync>> {
        Ok(self
            .client
            .get_block_height_with_commitment(self.commitment)
            .await?)
    }
}
