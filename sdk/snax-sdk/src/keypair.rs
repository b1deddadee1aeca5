use crate::core::wallet::{Capabilities, WalletError, WalletProvider};
use async_trait::async_trait;
use log::debug;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;

/// Wallet provider backed by a local keypair (CLI, scripts, tests).
///
/// Signs without prompting and leaves broadcasting to the caller.
pub struct KeypairWallet {
    keypair: Keypair,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

#[async_trait]
impl WalletProvider for KeypairWallet {
    async fn connect(&self, _only_if_trusted: bool) -> Result<Pubkey, WalletError> {
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            sign_and_send: false,
            sign: true,
        }
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        let blockhash = tx.message.recent_blockhash;
        tx.try_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Provider(e.to_string()))?;
        debug!("signed transaction {}", tx.signatures[0]);
        Ok(tx)
    }
}
