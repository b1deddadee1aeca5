use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

/// Errors reported by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// The user declined the prompt
    #[error("User rejected the request")]
    Rejected,

    /// Trusted connect without a prior grant
    #[error("Wallet has not trusted this app yet")]
    NotTrusted,

    /// The provider does not implement the requested capability
    #[error("Wallet does not support {0}")]
    Unsupported(&'static str),

    /// Any other provider failure, as reported
    #[error("{0}")]
    Provider(String),
}

/// Which signing calls a provider exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub sign_and_send: bool,
    pub sign: bool,
}

/// Signing path fixed for a session at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStrategy {
    /// Provider signs and submits in one call
    SignAndSend,
    /// Provider signs, the SDK broadcasts through the ledger RPC
    SignThenBroadcast,
}

impl SigningStrategy {
    /// Prefer the combined call; fall back to sign-only. `None` when the
    /// provider can do neither.
    pub fn negotiate(caps: Capabilities) -> Option<Self> {
        if caps.sign_and_send {
            Some(SigningStrategy::SignAndSend)
        } else if caps.sign {
            Some(SigningStrategy::SignThenBroadcast)
        } else {
            None
        }
    }
}

/// Abstraction for the user's signing agent.
/// This allows the SDK to work with:
/// 1. Browser wallet extensions bridged into Rust (sign-and-send flows)
/// 2. Local Keypairs (Backend/CLI)
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Connect and return the wallet address. With `only_if_trusted` the
    /// provider must not prompt and fails if no prior grant exists.
    async fn connect(&self, only_if_trusted: bool) -> Result<Pubkey, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    fn capabilities(&self) -> Capabilities;

    async fn sign_and_send_transaction(&self, _tx: Transaction) -> Result<Signature, WalletError> {
        Err(WalletError::Unsupported("signAndSendTransaction"))
    }

    async fn sign_transaction(&self, _tx: Transaction) -> Result<Transaction, WalletError> {
        Err(WalletError::Unsupported("signTransaction"))
    }
}
