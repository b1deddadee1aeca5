#![allow(dead_code)]

use async_trait::async_trait;
use snax_sdk::counter::{CounterAction, CounterState, COUNTER_PROGRAM_ID};
use snax_sdk::{
    Capabilities, Liveness, PriceOracle, SignatureState, SolConnection, SolPrice,
    TokenAccountView, TransferConfig, WalletError, WalletProvider,
};
use solana_sdk::{
    account::Account,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use spl_token::instruction::TokenInstruction;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const DECIMALS: u8 = 6;
pub const FEE_LAMPORTS: u64 = 5_000;
/// Rent-exempt minimum of a 165-byte token account
pub const RENT_LAMPORTS: u64 = 2_039_280;
/// Blocks a blockhash stays valid for, as on mainnet-beta
pub const VALIDITY_WINDOW: u64 = 150;

type BoxError = Box<dyn Error + Send + Sync>;

//=============================================================================
// In-memory ledger
//=============================================================================

#[derive(Default)]
struct LedgerState {
    lamports: HashMap<Pubkey, u64>,
    token_accounts: HashMap<Pubkey, TokenAccountView>,
    counters: HashMap<Pubkey, CounterState>,
    sent: Vec<Transaction>,
    landed: HashSet<Signature>,
    block_height: u64,
}

/// Ledger that executes token transfers, ATA creation and counter
/// instructions in memory.
pub struct MockLedger {
    pub mint: Pubkey,
    state: Mutex<LedgerState>,
    calls: AtomicUsize,
    /// Never report confirmation
    pub never_confirm: AtomicBool,
    /// Blocks advanced per `get_block_height` call
    pub height_step: AtomicUsize,
    /// Status error reported for every landed transaction
    pub land_error: Mutex<Option<String>>,
    pub fail_balance: AtomicBool,
    /// Status calls that fail before the node answers again
    pub fail_status_calls: AtomicUsize,
    /// Status calls that still report `Pending` for a landed transaction
    pub pending_polls: AtomicUsize,
}

impl MockLedger {
    pub fn new(mint: Pubkey) -> Self {
        Self {
            mint,
            state: Mutex::new(LedgerState::default()),
            calls: AtomicUsize::new(0),
            never_confirm: AtomicBool::new(false),
            height_step: AtomicUsize::new(1),
            land_error: Mutex::new(None),
            fail_balance: AtomicBool::new(false),
            fail_status_calls: AtomicUsize::new(0),
            pending_polls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_lamports(&self, owner: &Pubkey, lamports: u64) {
        self.state.lock().unwrap().lamports.insert(*owner, lamports);
    }

    pub fn lamports(&self, owner: &Pubkey) -> u64 {
        *self.state.lock().unwrap().lamports.get(owner).unwrap_or(&0)
    }

    /// Create (or top up) the owner's associated token account
    pub fn fund_tokens(&self, owner: &Pubkey, raw_amount: u64) -> Pubkey {
        let address = snax_sdk::derive_token_account(owner, &self.mint);
        let mut state = self.state.lock().unwrap();
        let entry = state
            .token_accounts
            .entry(address)
            .or_insert_with(|| TokenAccountView {
                address,
                owner: *owner,
                mint: self.mint,
                raw_amount: 0,
                decimals: DECIMALS,
            });
        entry.raw_amount += raw_amount;
        address
    }

    pub fn token_amount(&self, owner: &Pubkey) -> Option<u64> {
        let address = snax_sdk::derive_token_account(owner, &self.mint);
        self.state
            .lock()
            .unwrap()
            .token_accounts
            .get(&address)
            .map(|a| a.raw_amount)
    }

    pub fn counter(&self, address: &Pubkey) -> Option<CounterState> {
        self.state.lock().unwrap().counters.get(address).copied()
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().sent.clone()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Execute the supported instructions of `tx` against the state
    fn apply(state: &mut LedgerState, tx: &Transaction, mint: &Pubkey) -> Result<(), String> {
        let keys = &tx.message.account_keys;
        let payer = keys[0];
        let payer_lamports = state.lamports.get(&payer).copied().unwrap_or(0);
        if payer_lamports < FEE_LAMPORTS {
            return Err("Transaction simulation failed: Attempt to debit an account but found no record of a prior credit.".to_string());
        }

        let mut payer_lamports = payer_lamports - FEE_LAMPORTS;
        let mut accounts = state.token_accounts.clone();
        let mut counters = state.counters.clone();
        for (index, ix) in tx.message.instructions.iter().enumerate() {
            let program = keys[ix.program_id_index as usize];
            let account = |i: usize| keys[ix.accounts[i] as usize];
            let insufficient = || {
                format!(
                    "Transaction simulation failed: Error processing Instruction {}: custom program error: 0x1",
                    index
                )
            };

            if program == spl_associated_token_account::id() {
                let address = account(1);
                if accounts.contains_key(&address) {
                    return Err("Provided owner is not allowed".to_string());
                }
                // System program transfer of the rent-exempt minimum
                if payer_lamports < RENT_LAMPORTS {
                    return Err(insufficient());
                }
                payer_lamports -= RENT_LAMPORTS;
                accounts.insert(
                    address,
                    TokenAccountView {
                        address,
                        owner: account(2),
                        mint: account(3),
                        raw_amount: 0,
                        decimals: DECIMALS,
                    },
                );
            } else if program == spl_token::id() {
                let amount = match TokenInstruction::unpack(&ix.data) {
                    Ok(TokenInstruction::TransferChecked { amount, .. }) => amount,
                    _ => return Err("unsupported token instruction".to_string()),
                };
                let (source, destination) = (account(0), account(2));
                let available = accounts
                    .get(&source)
                    .filter(|a| a.mint == *mint)
                    .map(|a| a.raw_amount)
                    .ok_or("invalid account data for instruction")?;
                if !accounts.contains_key(&destination) {
                    return Err("invalid account data for instruction".to_string());
                }
                if available < amount {
                    return Err(insufficient());
                }
                if let Some(a) = accounts.get_mut(&source) {
                    a.raw_amount -= amount;
                }
                if let Some(a) = accounts.get_mut(&destination) {
                    a.raw_amount += amount;
                }
            } else if program == COUNTER_PROGRAM_ID {
                let action = CounterAction::from_data(&ix.data).ok_or(format!(
                    "Error processing Instruction {}: custom program error: 0x65",
                    index
                ))?;
                let (address, authority) = (account(0), account(1));
                if action == CounterAction::Initialize {
                    if counters.contains_key(&address) {
                        return Err(format!("Allocate: account Address {{ address: {}, base: None }} already in use", address));
                    }
                    counters.insert(address, CounterState { count: 0, authority });
                    continue;
                }
                let counter = counters.get_mut(&address).ok_or(format!(
                    "Error processing Instruction {}: custom program error: 0xbc4",
                    index
                ))?;
                if counter.authority != authority {
                    return Err(format!(
                        "Error processing Instruction {}: custom program error: 0x7d1",
                        index
                    ));
                }
                counter.count = match action {
                    CounterAction::Increment => counter.count + 1,
                    CounterAction::Decrement => counter.count.checked_sub(1).ok_or(format!(
                        "Error processing Instruction {}: custom program error: 0x1770",
                        index
                    ))?,
                    _ => 0,
                };
            } else {
                return Err(format!("unknown program {}", program));
            }
        }

        state.token_accounts = accounts;
        state.counters = counters;
        state.lamports.insert(payer, payer_lamports);
        Ok(())
    }
}

#[async_trait]
impl SolConnection for MockLedger {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, BoxError> {
        self.touch();
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err("RPC response error -32603: Internal error".into());
        }
        Ok(self.lamports(pubkey))
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<TokenAccountView>, BoxError> {
        self.touch();
        Ok(self
            .state
            .lock()
            .unwrap()
            .token_accounts
            .values()
            .filter(|a| a.owner == *owner && a.mint == *mint)
            .cloned()
            .collect())
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, BoxError> {
        self.touch();
        let state = self.state.lock().unwrap();
        if let Some(counter) = state.counters.get(pubkey) {
            return Ok(Some(Account {
                lamports: 1_224_960,
                data: counter.pack(),
                owner: COUNTER_PROGRAM_ID,
                executable: false,
                rent_epoch: 0,
            }));
        }
        Ok(state.token_accounts.get(pubkey).map(|_| Account {
            lamports: RENT_LAMPORTS,
            data: vec![0; 165],
            owner: spl_token::id(),
            executable: false,
            rent_epoch: 0,
        }))
    }

    async fn get_latest_blockhash(&self) -> Result<Liveness, BoxError> {
        self.touch();
        let height = self.state.lock().unwrap().block_height;
        Ok(Liveness {
            blockhash: Hash::new_unique(),
            last_valid_block_height: height + VALIDITY_WINDOW,
        })
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, BoxError> {
        self.touch();
        let mut state = self.state.lock().unwrap();
        Self::apply(&mut state, tx, &self.mint)?;

        let signature = match tx.signatures.first() {
            Some(sig) if *sig != Signature::default() => *sig,
            _ => Signature::new_unique(),
        };
        state.sent.push(tx.clone());
        state.landed.insert(signature);
        Ok(signature)
    }

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature, BoxError> {
        self.touch();
        let mut state = self.state.lock().unwrap();
        *state.lamports.entry(*pubkey).or_insert(0) += lamports;
        let signature = Signature::new_unique();
        state.landed.insert(signature);
        Ok(signature)
    }

    async fn get_signature_state(&self, signature: &Signature) -> Result<SignatureState, BoxError> {
        self.touch();
        if take_one(&self.fail_status_calls) {
            return Err("RPC response error -32603: Internal error".into());
        }
        if self.never_confirm.load(Ordering::SeqCst) {
            return Ok(SignatureState::Pending);
        }
        if let Some(err) = self.land_error.lock().unwrap().clone() {
            return Ok(SignatureState::Failed(err));
        }
        let landed = self.state.lock().unwrap().landed.contains(signature);
        if landed && take_one(&self.pending_polls) {
            return Ok(SignatureState::Pending);
        }
        Ok(if landed {
            SignatureState::Confirmed
        } else {
            SignatureState::Pending
        })
    }

    async fn get_block_height(&self) -> Result<u64, BoxError> {
        self.touch();
        let step = self.height_step.load(Ordering::SeqCst) as u64;
        let mut state = self.state.lock().unwrap();
        state.block_height += step;
        Ok(state.block_height)
    }
}

/// Decrement `counter` if positive; true when a unit was taken
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

//=============================================================================
// Scriptable wallet provider
//=============================================================================

pub struct MockWallet {
    pub keypair: Keypair,
    caps: Capabilities,
    /// Ledger used by the combined sign-and-send path
    ledger: Arc<MockLedger>,
    pub trusted: AtomicBool,
    /// Remaining explicit connects that fail before one succeeds
    pub connect_failures: AtomicUsize,
    pub reject: AtomicBool,
    pub connect_prompts: AtomicUsize,
    pub trusted_connects: AtomicUsize,
    pub sign_prompts: AtomicUsize,
    pub disconnects: AtomicUsize,
    /// When set, signing blocks until `release` is notified
    pub hold: AtomicBool,
    pub signing_started: Notify,
    pub release: Notify,
}

impl MockWallet {
    pub fn new(ledger: Arc<MockLedger>, caps: Capabilities) -> Self {
        Self {
            keypair: Keypair::new(),
            caps,
            ledger,
            trusted: AtomicBool::new(false),
            connect_failures: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
            connect_prompts: AtomicUsize::new(0),
            trusted_connects: AtomicUsize::new(0),
            sign_prompts: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            hold: AtomicBool::new(false),
            signing_started: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn address(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn prompts(&self) -> usize {
        self.sign_prompts.load(Ordering::SeqCst)
    }

    async fn prompt(&self) -> Result<(), WalletError> {
        self.sign_prompts.fetch_add(1, Ordering::SeqCst);
        self.signing_started.notify_one();
        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected);
        }
        Ok(())
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn connect(&self, only_if_trusted: bool) -> Result<Pubkey, WalletError> {
        if only_if_trusted {
            self.trusted_connects.fetch_add(1, Ordering::SeqCst);
            return if self.trusted.load(Ordering::SeqCst) {
                Ok(self.address())
            } else {
                Err(WalletError::NotTrusted)
            };
        }

        self.connect_prompts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.connect_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.connect_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(WalletError::Provider("Unexpected error".to_string()));
        }
        self.trusted.store(true, Ordering::SeqCst);
        Ok(self.address())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    async fn sign_and_send_transaction(&self, mut tx: Transaction) -> Result<Signature, WalletError> {
        if !self.caps.sign_and_send {
            return Err(WalletError::Unsupported("signAndSendTransaction"));
        }
        self.prompt().await?;
        let blockhash = tx.message.recent_blockhash;
        tx.try_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Provider(e.to_string()))?;
        self.ledger
            .send_transaction(&tx)
            .await
            .map_err(|e| WalletError::Provider(e.to_string()))
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        if !self.caps.sign {
            return Err(WalletError::Unsupported("signTransaction"));
        }
        self.prompt().await?;
        let blockhash = tx.message.recent_blockhash;
        tx.try_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Provider(e.to_string()))?;
        Ok(tx)
    }
}

//=============================================================================
// Price oracle
//=============================================================================

/// Fixed price; `None` simulates an unreachable feed.
pub struct FixedPrice(pub Option<SolPrice>);

#[async_trait]
impl PriceOracle for FixedPrice {
    async fn fetch_price(&self) -> Result<SolPrice, BoxError> {
        self.0.ok_or_else(|| "price feed unreachable".into())
    }
}

//=============================================================================
// Context
//=============================================================================

pub const SIGN_AND_SEND: Capabilities = Capabilities {
    sign_and_send: true,
    sign: true,
};

pub const SIGN_ONLY: Capabilities = Capabilities {
    sign_and_send: false,
    sign: true,
};

pub struct TestContext {
    pub ledger: Arc<MockLedger>,
    pub wallet: Arc<MockWallet>,
    pub config: TransferConfig,
}

impl TestContext {
    pub fn new(caps: Capabilities) -> Self {
        let mint = Pubkey::new_unique();
        let ledger = Arc::new(MockLedger::new(mint));
        let wallet = Arc::new(MockWallet::new(Arc::clone(&ledger), caps));
        let config = TransferConfig::new(mint, DECIMALS)
            .with_poll_interval(Duration::from_millis(1))
            .with_refresh_delay(Duration::from_millis(20))
            .with_connect_retry_delay(Duration::from_millis(5));
        Self {
            ledger,
            wallet,
            config,
        }
    }

    pub fn sender(&self) -> Pubkey {
        self.wallet.address()
    }
}

pub fn setup_test_context() -> TestContext {
    TestContext::new(SIGN_AND_SEND)
}
