pub mod builder;
pub mod confirm;
pub mod gate;

use crate::balance::BalanceRefresher;
use crate::config::TransferConfig;
use crate::core::connection::{Liveness, SolConnection};
use crate::core::wallet::{SigningStrategy, WalletError, WalletProvider};
use crate::error::{classify_batch_error, classify_error, ledger_error, Result, SnaxSdkError};
use crate::types::{
    BalanceSnapshot, TransferOutcome, TransferRequest, TransferStatus, WalletSession,
};
use builder::TransferBuilder;
use gate::{AttemptPhase, TransferGate};
use log::{debug, info, warn};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use tokio::sync::watch;

/// Runs token transfers for a wallet session: account resolution, batch
/// assembly, signing, broadcast and confirmation.
pub struct TransferOrchestrator<C, W> {
    connection: Arc<C>,
    wallet: Arc<W>,
    config: TransferConfig,
    refresher: BalanceRefresher<C>,
    gate: TransferGate,
    status: watch::Sender<Option<TransferStatus>>,
    balances: Arc<watch::Sender<Option<BalanceSnapshot>>>,
}

impl<C, W> TransferOrchestrator<C, W>
where
    C: SolConnection + 'static,
    W: WalletProvider,
{
    pub fn new(connection: Arc<C>, wallet: Arc<W>, config: TransferConfig) -> Self {
        let refresher = BalanceRefresher::new(Arc::clone(&connection), &config);
        let (status, _) = watch::channel(None);
        let (balances, _) = watch::channel(None);
        Self {
            connection,
            wallet,
            config,
            refresher,
            gate: TransferGate::new(),
            status,
            balances: Arc::new(balances),
        }
    }

    /// Live status of the current (or last) attempt
    pub fn status(&self) -> watch::Receiver<Option<TransferStatus>> {
        self.status.subscribe()
    }

    /// Snapshots published by the delayed post-transfer refresh
    pub fn balance_updates(&self) -> watch::Receiver<Option<BalanceSnapshot>> {
        self.balances.subscribe()
    }

    pub fn phase(&self) -> AttemptPhase {
        self.gate.phase()
    }

    pub fn refresher(&self) -> &BalanceRefresher<C> {
        &self.refresher
    }

    /// Transfer `amount` (decimal text) of the configured token to `recipient`.
    ///
    /// Returns `None` without side effects while another attempt is pending.
    pub async fn transfer(
        &self,
        session: &WalletSession,
        amount: &str,
        recipient: &str,
    ) -> Option<TransferOutcome> {
        let Some(attempt) = self.gate.try_begin() else {
            warn!("transfer already in flight, ignoring duplicate request");
            return None;
        };
        self.publish(TransferStatus::Pending);

        let outcome = match self.submit(session, amount, recipient).await {
            Err(err) => TransferOutcome::failed(err, None),
            Ok((signature, liveness, transfer_index)) => {
                self.publish(TransferStatus::Confirming);
                match confirm::await_confirmation(
                    self.connection.as_ref(),
                    &signature,
                    &liveness,
                    Some(transfer_index),
                    self.config.poll_interval,
                )
                .await
                {
                    Ok(()) => TransferOutcome::succeeded(signature),
                    Err(err) => TransferOutcome::failed(err, Some(signature)),
                }
            },
        };

        match &outcome.error {
            None => info!("transfer confirmed: {:?}", outcome.signature),
            Some(err) => warn!("transfer failed ({:?}): {}", err.kind(), err),
        }

        self.publish(outcome.status);
        attempt.finish(outcome.status);

        if outcome.is_success() {
            self.schedule_refresh(session.address);
        }
        Some(outcome)
    }

    /// Steps up to and including submission. Returns the signature, the
    /// liveness token it was built against and the transfer's batch position.
    async fn submit(
        &self,
        session: &WalletSession,
        amount: &str,
        recipient: &str,
    ) -> Result<(Signature, Liveness, usize)> {
        if !session.connected {
            return Err(SnaxSdkError::NotConnected);
        }
        let request = TransferRequest::parse(amount, recipient, self.config.decimals)?;
        let sender = session.address;

        // 1. sender token account
        let source = self
            .refresher
            .resolve_token_account(&sender)
            .await?
            .ok_or(SnaxSdkError::NoTokenAccount {
                owner: sender,
                mint: self.config.mint,
            })?;
        if source.decimals != self.config.decimals {
            return Err(SnaxSdkError::Unknown(format!(
                "mint {} has {} decimals, configured {}",
                self.config.mint, source.decimals, self.config.decimals
            )));
        }

        // 2. balance, before any wallet prompt
        if request.amount > source.raw_amount {
            return Err(SnaxSdkError::InsufficientBalance {
                requested: request.amount,
                available: source.raw_amount,
            });
        }

        // 3-5. batch
        let builder = TransferBuilder::new(self.config.mint, self.config.decimals)
            .with_sender(sender)
            .with_source(source.address)
            .with_recipient(request.recipient)
            .with_amount(request.amount);
        let destination = builder
            .recipient_token_account()
            .ok_or_else(|| SnaxSdkError::InvalidAddress("recipient required".to_string()))?;
        let recipient_exists = self
            .connection
            .get_account(&destination)
            .await
            .map_err(ledger_error)?
            .is_some();
        if !recipient_exists {
            debug!("recipient token account {} missing, creating it", destination);
        }
        let builder = builder.create_recipient_account(!recipient_exists);

        // 6. fresh blockhash right before signing
        let liveness = self
            .connection
            .get_latest_blockhash()
            .await
            .map_err(ledger_error)?;
        let tx = builder.build_transaction(&liveness)?;

        // 7. sign + submit
        let transfer_index = builder.transfer_index();
        self.publish(TransferStatus::AwaitingSignature);
        let signature = sign_and_submit(
            self.connection.as_ref(),
            self.wallet.as_ref(),
            session.strategy,
            tx,
            Some(transfer_index),
        )
        .await?;
        info!(
            "submitted {} of {} to {}: {}",
            request.amount, self.config.mint, request.recipient, signature
        );

        Ok((signature, liveness, transfer_index))
    }

    fn publish(&self, status: TransferStatus) {
        debug!("transfer status -> {:?}", status);
        self.status.send_replace(Some(status));
    }

    fn schedule_refresh(&self, owner: Pubkey) {
        let refresher = self.refresher.clone();
        let balances = Arc::clone(&self.balances);
        let delay = self.config.refresh_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match refresher.refresh(&owner).await {
                Ok(snapshot) => {
                    balances.send_replace(Some(snapshot));
                },
                Err(err) => warn!("post-transfer balance refresh failed: {}", err),
            }
        });
    }
}

/// Sign `tx` along the negotiated path and hand it to the ledger.
///
/// Submission failures are classified against the token transfer's position
/// in the batch when there is one.
pub(crate) async fn sign_and_submit<C, W>(
    connection: &C,
    wallet: &W,
    strategy: SigningStrategy,
    tx: Transaction,
    transfer_index: Option<usize>,
) -> Result<Signature>
where
    C: SolConnection + ?Sized,
    W: WalletProvider + ?Sized,
{
    let classify = |detail: &str| match transfer_index {
        Some(index) => classify_batch_error(detail, index),
        None => classify_error(detail),
    };

    match strategy {
        SigningStrategy::SignAndSend => {
            wallet
                .sign_and_send_transaction(tx)
                .await
                .map_err(|err| match err {
                    WalletError::Provider(detail) => classify(&detail),
                    other => other.into(),
                })
        },
        SigningStrategy::SignThenBroadcast => {
            let signed = wallet.sign_transaction(tx).await?;
            connection
                .send_transaction(&signed)
                .await
                .map_err(|err| classify(&err.to_string()))
        },
    }
}
