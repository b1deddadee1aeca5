use crate::types::TransferStatus;
use std::sync::Mutex;

/// Lifecycle of the orchestrator's single transfer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Idle,
    Pending,
    /// Last attempt finished with this status
    Terminal(TransferStatus),
}

/// Admits at most one transfer attempt at a time.
///
/// `Idle | Terminal → Pending` happens only through [`TransferGate::try_begin`];
/// `Pending → Terminal` only through the returned [`InFlight`] token, so an
/// attempt cannot leave the gate stuck in `Pending`.
#[derive(Debug)]
pub struct TransferGate {
    phase: Mutex<AttemptPhase>,
}

impl Default for TransferGate {
    fn default() -> Self {
        Self {
            phase: Mutex::new(AttemptPhase::Idle),
        }
    }
}

impl TransferGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> AttemptPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim the slot. `None` while another attempt is pending.
    pub fn try_begin(&self) -> Option<InFlight<'_>> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if *phase == AttemptPhase::Pending {
            return None;
        }
        *phase = AttemptPhase::Pending;
        Some(InFlight {
            gate: self,
            finished: false,
        })
    }

    fn settle(&self, status: TransferStatus) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = AttemptPhase::Terminal(status);
    }
}

/// Proof of holding the transfer slot. Dropping it unfinished records `Failed`.
#[derive(Debug)]
pub struct InFlight<'a> {
    gate: &'a TransferGate,
    finished: bool,
}

impl InFlight<'_> {
    pub fn finish(mut self, status: TransferStatus) {
        self.finished = true;
        self.gate.settle(status);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.gate.settle(TransferStatus::Failed);
        }
    }
}
