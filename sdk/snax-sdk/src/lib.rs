pub mod balance;
pub mod config;
pub mod core;
pub mod counter;
pub mod error;
pub mod keypair;
pub mod lockup;
pub mod price;
pub mod rpc;
pub mod session;
pub mod transfer;
pub mod types;
pub mod utils;

pub use crate::balance::BalanceRefresher;
pub use crate::config::{load_config, SdkConfig, TransferConfig};
pub use crate::core::connection::{Liveness, SignatureState, SolConnection};
pub use crate::counter::{CounterAction, CounterClient, CounterState, COUNTER_PROGRAM_ID};
pub use crate::core::wallet::{Capabilities, SigningStrategy, WalletError, WalletProvider};
pub use crate::error::{classify_batch_error, classify_error, ErrorKind, Result, SnaxSdkError};
pub use crate::keypair::KeypairWallet;
pub use crate::lockup::{LockupClient, LockupError};
pub use crate::price::{CoinGeckoOracle, PriceOracle};
pub use crate::rpc::RpcConnection;
pub use crate::session::{AddressCache, ConnectedSession, ConnectionResolver, SessionViews};
pub use crate::transfer::builder::TransferBuilder;
pub use crate::transfer::gate::AttemptPhase;
pub use crate::transfer::TransferOrchestrator;
pub use crate::types::{
    BalanceSnapshot, LockupEntry, SolPrice, TokenAccountView, TransferOutcome, TransferRequest,
    TransferStatus, WalletSession,
};
pub use crate::utils::{derive_token_account, format_token_amount, parse_address, parse_token_amount};
