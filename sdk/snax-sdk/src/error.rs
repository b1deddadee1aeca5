use crate::core::wallet::WalletError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

/// SDK-specific error types for SNAX wallet and transfer operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnaxSdkError {
    /// No connected wallet session
    #[error("Wallet is not connected")]
    NotConnected,

    /// Amount is not a positive decimal within the token precision
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Recipient or account address is malformed
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Sender holds no token account for the configured mint
    #[error("No token account for owner {owner} and mint {mint}")]
    NoTokenAccount { owner: Pubkey, mint: Pubkey },

    /// Requested amount exceeds the available token balance (raw units)
    #[error("Insufficient token balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    /// Sender cannot pay network fees
    #[error("Insufficient funds for network fees: {0}")]
    InsufficientFeeFunds(String),

    /// Signer declined the request
    #[error("Transaction rejected by signer: {0}")]
    TransactionRejected(String),

    /// Ledger rejected the transaction after submission
    #[error("Transaction failed on ledger: {0}")]
    TransactionFailed(String),

    /// Blockhash expired before confirmation was observed
    #[error("Confirmation timed out for {signature}")]
    ConfirmationTimeout { signature: Signature },

    /// RPC node reported an internal error
    #[error("Ledger internal error: {0}")]
    LedgerInternalError(String),

    /// Wallet connect handshake failed
    #[error("Wallet connection failed: {0}")]
    ConnectFailed(String),

    /// Anything not covered above; keeps the raw detail
    #[error("{0}")]
    Unknown(String),
}

/// Fieldless discriminant of [`SnaxSdkError`], for kind-specific rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotConnected,
    InvalidAmount,
    InvalidAddress,
    NoTokenAccount,
    InsufficientBalance,
    InsufficientFeeFunds,
    TransactionRejected,
    TransactionFailed,
    ConfirmationTimeout,
    LedgerInternalError,
    ConnectFailed,
    Unknown,
}

impl ErrorKind {
    /// Short user-facing hint for this kind of failure.
    pub fn guidance(&self) -> &'static str {
        match self {
            ErrorKind::NotConnected => "Connect your wallet first.",
            ErrorKind::InvalidAmount => "Enter an amount greater than zero.",
            ErrorKind::InvalidAddress => "Check the recipient address.",
            ErrorKind::NoTokenAccount => "This wallet holds no tokens of this kind yet.",
            ErrorKind::InsufficientBalance => "Not enough tokens for this transfer.",
            ErrorKind::InsufficientFeeFunds => "Top up SOL to pay network fees.",
            ErrorKind::TransactionRejected => "The request was declined in the wallet.",
            ErrorKind::TransactionFailed => "The network rejected the transaction.",
            ErrorKind::ConfirmationTimeout => {
                "Confirmation took too long; check the explorer before retrying."
            },
            ErrorKind::LedgerInternalError => "The RPC node failed; try again shortly.",
            ErrorKind::ConnectFailed => "Unlock the wallet and try connecting again.",
            ErrorKind::Unknown => "Unexpected error; see details.",
        }
    }
}

impl SnaxSdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SnaxSdkError::NotConnected => ErrorKind::NotConnected,
            SnaxSdkError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            SnaxSdkError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            SnaxSdkError::NoTokenAccount { .. } => ErrorKind::NoTokenAccount,
            SnaxSdkError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            SnaxSdkError::InsufficientFeeFunds(_) => ErrorKind::InsufficientFeeFunds,
            SnaxSdkError::TransactionRejected(_) => ErrorKind::TransactionRejected,
            SnaxSdkError::TransactionFailed(_) => ErrorKind::TransactionFailed,
            SnaxSdkError::ConfirmationTimeout { .. } => ErrorKind::ConfirmationTimeout,
            SnaxSdkError::LedgerInternalError(_) => ErrorKind::LedgerInternalError,
            SnaxSdkError::ConnectFailed(_) => ErrorKind::ConnectFailed,
            SnaxSdkError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

impl From<WalletError> for SnaxSdkError {
    fn from(err: WalletError) -> Self {
        let detail = err.to_string();
        match err {
            WalletError::Rejected => SnaxSdkError::TransactionRejected(detail),
            WalletError::NotTrusted => SnaxSdkError::ConnectFailed(detail),
            WalletError::Unsupported(_) => SnaxSdkError::Unknown(detail),
            WalletError::Provider(_) => classify_error(&detail),
        }
    }
}

/// Classify an adapter error from the ledger RPC
pub(crate) fn ledger_error(err: Box<dyn std::error::Error + Send + Sync>) -> SnaxSdkError {
    classify_error(&err.to_string())
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, SnaxSdkError>;

//=============================================================================
// Error classification
//=============================================================================

/// Ordered match table. The first row with a matching needle wins, so the
/// fee-funds row must stay ahead of the generic "insufficient funds" row.
/// Needles match whole tokens only: `"code 4001"` does not match inside
/// `"code 40011"`.
const CLASSIFICATION_TABLE: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::TransactionRejected,
        &[
            "user rejected",
            "rejected the request",
            "declined",
            "code 4001",
            "code: 4001",
            "\"code\":4001",
        ],
    ),
    (
        ErrorKind::InsufficientFeeFunds,
        &[
            "insufficient funds for fee",
            "insufficient funds for rent",
            "insufficient lamports",
            "no record of a prior credit",
        ],
    ),
    (ErrorKind::InsufficientBalance, &["insufficient funds"]),
    (
        ErrorKind::InvalidAddress,
        &[
            "invalid public key",
            "invalid address",
            "wrongsize",
            "invalid base58",
        ],
    ),
    (ErrorKind::LedgerInternalError, &["internal error", "-32603"]),
];

/// `custom program error: 0x1` from the token program (`InsufficientFunds`)
/// and from the system program (`ResultWithNegativeLamports`) alike.
const CUSTOM_INSUFFICIENT: u32 = 0x1;

/// `needle` occurs in `haystack` with no alphanumeric character on either side
fn contains_token(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// `(instruction index, code)` of an `Error processing Instruction N: custom
/// program error: 0xC` failure. The index is absent when the text omits it.
fn custom_program_error(lowered: &str) -> Option<(Option<usize>, u32)> {
    const MARKER: &str = "custom program error: 0x";
    let at = lowered.find(MARKER)?;
    let hex: String = lowered[at + MARKER.len()..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect();
    let code = u32::from_str_radix(&hex, 16).ok()?;

    let index = lowered[..at].rfind("instruction ").and_then(|i| {
        let digits: String = lowered[i + "instruction ".len()..at]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    });
    Some((index, code))
}

/// Map raw provider/RPC error text onto a structured error.
///
/// Upstream SDKs only hand back strings; this is the one place where they
/// are pattern matched. Without batch context a `custom program error: 0x1`
/// is read as the token program's `InsufficientFunds`; use
/// [`classify_batch_error`] for failures of a submitted transfer batch.
pub fn classify_error(detail: &str) -> SnaxSdkError {
    classify(detail, None)
}

/// Classify the failure of a submitted batch whose token transfer is
/// instruction `transfer_index`. A `0x1` raised by any other instruction
/// (the system program funding the recipient account) is a lack of SOL.
pub fn classify_batch_error(detail: &str, transfer_index: usize) -> SnaxSdkError {
    classify(detail, Some(transfer_index))
}

fn classify(detail: &str, transfer_index: Option<usize>) -> SnaxSdkError {
    let lowered = detail.to_lowercase();

    let kind = match custom_program_error(&lowered) {
        Some((index, CUSTOM_INSUFFICIENT)) => match (index, transfer_index) {
            (Some(failed), Some(transfer)) if failed != transfer => ErrorKind::InsufficientFeeFunds,
            _ => ErrorKind::InsufficientBalance,
        },
        _ => CLASSIFICATION_TABLE
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| contains_token(&lowered, n)))
            .map(|(kind, _)| *kind)
            .unwrap_or(ErrorKind::Unknown),
    };

    let detail = detail.to_string();
    match kind {
        ErrorKind::TransactionRejected => SnaxSdkError::TransactionRejected(detail),
        ErrorKind::InsufficientFeeFunds => SnaxSdkError::InsufficientFeeFunds(detail),
        // Raw text carries no amounts; zeros mark "reported by the ledger".
        ErrorKind::InsufficientBalance => SnaxSdkError::InsufficientBalance {
            requested: 0,
            available: 0,
        },
        ErrorKind::InvalidAddress => SnaxSdkError::InvalidAddress(detail),
        ErrorKind::LedgerInternalError => SnaxSdkError::LedgerInternalError(detail),
        _ => SnaxSdkError::Unknown(detail),
    }
}
