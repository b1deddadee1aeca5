use crate::config::TransferConfig;
use crate::core::connection::SolConnection;
use crate::core::wallet::WalletProvider;
use crate::error::{ledger_error, Result, SnaxSdkError};
use crate::transfer::{confirm, sign_and_submit};
use crate::types::WalletSession;
use log::{debug, info};
use solana_sdk::hash::hashv;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use std::time::Duration;

/// Devnet counter program
pub const COUNTER_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

/// Discriminator + count + authority
pub const COUNTER_ACCOUNT_LEN: usize = 8 + 8 + 32;

/// First 8 bytes of `sha256("{namespace}:{name}")`
fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = hashv(&[namespace.as_bytes(), b":", name.as_bytes()]);
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash.to_bytes()[..8]);
    out
}

/// The counter program's instructions; none take arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAction {
    Initialize,
    Increment,
    Decrement,
    Reset,
}

impl CounterAction {
    pub const ALL: [CounterAction; 4] = [
        CounterAction::Initialize,
        CounterAction::Increment,
        CounterAction::Decrement,
        CounterAction::Reset,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CounterAction::Initialize => "initialize",
            CounterAction::Increment => "increment",
            CounterAction::Decrement => "decrement",
            CounterAction::Reset => "reset",
        }
    }

    pub fn discriminator(&self) -> [u8; 8] {
        discriminator("global", self.name())
    }

    /// Action whose discriminator prefixes `data`
    pub fn from_data(data: &[u8]) -> Option<Self> {
        let prefix = data.get(..8)?;
        Self::ALL
            .into_iter()
            .find(|action| action.discriminator() == prefix)
    }

    pub fn instruction(&self, program_id: &Pubkey, counter: &Pubkey, authority: &Pubkey) -> Instruction {
        let accounts = match self {
            CounterAction::Initialize => vec![
                AccountMeta::new(*counter, false),
                AccountMeta::new(*authority, true),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            _ => vec![
                AccountMeta::new(*counter, false),
                AccountMeta::new_readonly(*authority, true),
            ],
        };
        Instruction {
            program_id: *program_id,
            accounts,
            data: self.discriminator().to_vec(),
        }
    }
}

/// Decoded counter account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterState {
    pub count: u64,
    pub authority: Pubkey,
}

impl CounterState {
    pub fn account_discriminator() -> [u8; 8] {
        discriminator("account", "Counter")
    }

    pub fn unpack(data: &[u8]) -> Result<Self> {
        if data.len() < COUNTER_ACCOUNT_LEN {
            return Err(SnaxSdkError::Unknown(format!(
                "counter account too short: {} bytes",
                data.len()
            )));
        }
        if data[..8] != Self::account_discriminator() {
            return Err(SnaxSdkError::Unknown(
                "account is not a counter".to_string(),
            ));
        }

        let mut count = [0u8; 8];
        count.copy_from_slice(&data[8..16]);
        let mut authority = [0u8; 32];
        authority.copy_from_slice(&data[16..48]);
        Ok(Self {
            count: u64::from_le_bytes(count),
            authority: Pubkey::new_from_array(authority),
        })
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(COUNTER_ACCOUNT_LEN);
        data.extend_from_slice(&Self::account_discriminator());
        data.extend_from_slice(&self.count.to_le_bytes());
        data.extend_from_slice(self.authority.as_ref());
        data
    }
}

/// Reads and drives the counter program with the connected wallet as authority.
pub struct CounterClient<C, W> {
    connection: Arc<C>,
    wallet: Arc<W>,
    program_id: Pubkey,
    poll_interval: Duration,
}

impl<C, W> CounterClient<C, W>
where
    C: SolConnection,
    W: WalletProvider,
{
    pub fn new(connection: Arc<C>, wallet: Arc<W>, config: &TransferConfig) -> Self {
        Self {
            connection,
            wallet,
            program_id: COUNTER_PROGRAM_ID,
            poll_interval: config.poll_interval,
        }
    }

    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub async fn get_counter(&self, counter: &Pubkey) -> Result<CounterState> {
        let account = self
            .connection
            .get_account(counter)
            .await
            .map_err(ledger_error)?
            .ok_or_else(|| SnaxSdkError::Unknown(format!("counter {} not found", counter)))?;
        if account.owner != self.program_id {
            return Err(SnaxSdkError::Unknown(format!(
                "{} is owned by {}, not the counter program",
                counter, account.owner
            )));
        }
        CounterState::unpack(&account.data)
    }

    /// Sign, submit and confirm one counter instruction.
    pub async fn execute(
        &self,
        session: &WalletSession,
        counter: &Pubkey,
        action: CounterAction,
    ) -> Result<Signature> {
        if !session.connected {
            return Err(SnaxSdkError::NotConnected);
        }

        let ix = action.instruction(&self.program_id, counter, &session.address);
        let liveness = self
            .connection
            .get_latest_blockhash()
            .await
            .map_err(ledger_error)?;
        let tx = Transaction::new_unsigned(Message::new_with_blockhash(
            &[ix],
            Some(&session.address),
            &liveness.blockhash,
        ));
        debug!("counter {} on {}", action.name(), counter);

        let signature = sign_and_submit(
            self.connection.as_ref(),
            self.wallet.as_ref(),
            session.strategy,
            tx,
            None,
        )
        .await?;
        confirm::await_confirmation(
            self.connection.as_ref(),
            &signature,
            &liveness,
            None,
            self.poll_interval,
        )
        .await?;

        info!("counter {} on {} confirmed: {}", action.name(), counter, signature);
        Ok(signature)
    }

    pub async fn initialize(&self, session: &WalletSession, counter: &Pubkey) -> Result<Signature> {
        self.execute(session, counter, CounterAction::Initialize).await
    }

    pub async fn increment(&self, session: &WalletSession, counter: &Pubkey) -> Result<Signature> {
        self.execute(session, counter, CounterAction::Increment).await
    }

    pub async fn decrement(&self, session: &WalletSession, counter: &Pubkey) -> Result<Signature> {
        self.execute(session, counter, CounterAction::Decrement).await
    }

    pub async fn reset(&self, session: &WalletSession, counter: &Pubkey) -> Result<Signature> {
        self.execute(session, counter, CounterAction::Reset).await
    }
}
