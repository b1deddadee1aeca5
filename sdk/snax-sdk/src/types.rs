use crate::core::wallet::SigningStrategy;
use crate::error::SnaxSdkError;
use crate::utils;
use serde::Deserialize;
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

/// An established wallet connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub connected: bool,

    /// Wallet (owner) address
    pub address: Pubkey,

    /// Signing path negotiated at connect time
    pub strategy: SigningStrategy,
}

/// Token account state as read from the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccountView {
    /// Token account address
    pub address: Pubkey,
    pub owner: Pubkey,
    pub mint: Pubkey,

    /// Amount in base units
    pub raw_amount: u64,
    pub decimals: u8,
}

impl TokenAccountView {
    /// Zero-balance view for an owner without a token account
    pub fn empty(owner: Pubkey, mint: Pubkey, decimals: u8) -> Self {
        Self {
            address: utils::derive_token_account(&owner, &mint),
            owner,
            mint,
            raw_amount: 0,
            decimals,
        }
    }

    /// `raw_amount / 10^decimals`, for display only
    pub fn display_amount(&self) -> f64 {
        self.raw_amount as f64 / 10f64.powi(self.decimals as i32)
    }

    /// Exact decimal rendering of the balance
    pub fn display_string(&self) -> String {
        utils::format_token_amount(self.raw_amount, self.decimals)
    }
}

/// Validated transfer input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    /// Amount in base units
    pub amount: u64,
    pub recipient: Pubkey,
}

impl TransferRequest {
    /// Parse user input. Performs no network access.
    pub fn parse(amount: &str, recipient: &str, decimals: u8) -> crate::Result<Self> {
        let amount = utils::parse_token_amount(amount, decimals)?;
        let recipient = utils::parse_address(recipient)?;
        Ok(Self { amount, recipient })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Pending,
    AwaitingSignature,
    Confirming,
    Succeeded,
    Failed,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Succeeded | TransferStatus::Failed)
    }
}

/// Terminal result of one transfer attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub status: TransferStatus,
    pub signature: Option<Signature>,
    pub error: Option<SnaxSdkError>,
}

impl TransferOutcome {
    pub fn succeeded(signature: Signature) -> Self {
        Self {
            status: TransferStatus::Succeeded,
            signature: Some(signature),
            error: None,
        }
    }

    /// Failure, keeping the signature if one was already obtained
    pub fn failed(error: SnaxSdkError, signature: Option<Signature>) -> Self {
        Self {
            status: TransferStatus::Failed,
            signature,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TransferStatus::Succeeded
    }
}

/// Native and token balances of one owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub native_lamports: u64,
    pub token: TokenAccountView,
}

impl BalanceSnapshot {
    pub fn sol(&self) -> f64 {
        lamports_to_sol(self.native_lamports)
    }
}

/// SOL spot price in the display currencies
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct SolPrice {
    #[serde(default)]
    pub usd: f64,
    #[serde(default)]
    pub krw: f64,
}

impl SolPrice {
    /// Value of `sol` in (USD, KRW)
    pub fn value_of(&self, sol: f64) -> (f64, f64) {
        (sol * self.usd, sol * self.krw)
    }

    pub fn is_known(&self) -> bool {
        self.usd > 0.0 || self.krw > 0.0
    }
}

/// One scheduled unlock, as served by the lockup backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockupEntry {
    pub unlock_month: String,
    pub amount: u64,
    pub unlocked: bool,
}
