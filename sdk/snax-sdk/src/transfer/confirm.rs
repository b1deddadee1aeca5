use crate::core::connection::{Liveness, SignatureState, SolConnection};
use crate::error::{
    classify_batch_error, classify_error, ledger_error, ErrorKind, Result, SnaxSdkError,
};
use log::{debug, warn};
use solana_sdk::signature::Signature;
use std::error::Error;
use std::time::Duration;

/// Consecutive failed polls after which the RPC node is considered gone
const MAX_CONSECUTIVE_RPC_ERRORS: u32 = 20;

/// Poll until `signature` is confirmed, fails on ledger, or the blockhash in
/// `liveness` can no longer land.
///
/// Transient RPC errors are logged and polling continues; only a run of
/// [`MAX_CONSECUTIVE_RPC_ERRORS`] ends it early. `transfer_index` locates the
/// token transfer inside the batch for failure classification.
pub async fn await_confirmation<C: SolConnection + ?Sized>(
    connection: &C,
    signature: &Signature,
    liveness: &Liveness,
    transfer_index: Option<usize>,
    poll_interval: Duration,
) -> Result<()> {
    let mut failures = 0u32;

    loop {
        match connection.get_signature_state(signature).await {
            Ok(SignatureState::Confirmed) => return Ok(()),
            Ok(SignatureState::Failed(detail)) => return Err(landed_error(detail, transfer_index)),
            Ok(SignatureState::Pending) => match connection.get_block_height().await {
                Ok(height) if height > liveness.last_valid_block_height => {
                    return final_check(connection, signature, transfer_index).await;
                },
                Ok(height) => {
                    failures = 0;
                    debug!(
                        "{} pending at height {} (valid through {})",
                        signature, height, liveness.last_valid_block_height
                    );
                },
                Err(err) => note_failure(&mut failures, "block height", signature, err)?,
            },
            Err(err) => note_failure(&mut failures, "signature status", signature, err)?,
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Count one failed poll; the run limit turns it into the attempt's error.
fn note_failure(
    failures: &mut u32,
    what: &str,
    signature: &Signature,
    err: Box<dyn Error + Send + Sync>,
) -> Result<()> {
    *failures += 1;
    warn!(
        "{} unavailable while confirming {} ({}/{}): {}",
        what, signature, failures, MAX_CONSECUTIVE_RPC_ERRORS, err
    );
    if *failures >= MAX_CONSECUTIVE_RPC_ERRORS {
        return Err(ledger_error(err));
    }
    Ok(())
}

/// Last status read once the blockhash has expired; the transaction may have
/// confirmed between the previous status poll and the height read.
async fn final_check<C: SolConnection + ?Sized>(
    connection: &C,
    signature: &Signature,
    transfer_index: Option<usize>,
) -> Result<()> {
    match connection.get_signature_state(signature).await {
        Ok(SignatureState::Confirmed) => Ok(()),
        Ok(SignatureState::Failed(detail)) => Err(landed_error(detail, transfer_index)),
        Ok(SignatureState::Pending) => Err(SnaxSdkError::ConfirmationTimeout {
            signature: *signature,
        }),
        Err(err) => {
            warn!("final status read for {} failed: {}", signature, err);
            Err(SnaxSdkError::ConfirmationTimeout {
                signature: *signature,
            })
        },
    }
}

/// Ledger-side failure; known causes keep their kind, the rest are `TransactionFailed`
fn landed_error(detail: String, transfer_index: Option<usize>) -> SnaxSdkError {
    let classified = match transfer_index {
        Some(index) => classify_batch_error(&detail, index),
        None => classify_error(&detail),
    };
    match classified {
        err if err.kind() == ErrorKind::Unknown => SnaxSdkError::TransactionFailed(detail),
        err => err,
    }
}
