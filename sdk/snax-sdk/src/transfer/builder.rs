use crate::core::connection::Liveness;
use crate::error::{Result, SnaxSdkError};
use crate::utils;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;

/// Assembles the instruction batch for one token transfer:
/// `[create recipient ATA]?, transfer_checked`.
#[derive(Debug, Clone)]
pub struct TransferBuilder {
    mint: Pubkey,
    decimals: u8,
    sender: Option<Pubkey>,
    source: Option<Pubkey>,
    recipient: Option<Pubkey>,
    amount: u64,
    create_recipient_account: bool,
}

impl TransferBuilder {
    pub fn new(mint: Pubkey, decimals: u8) -> Self {
        Self {
            mint,
            decimals,
            sender: None,
            source: None,
            recipient: None,
            amount: 0,
            create_recipient_account: false,
        }
    }

    /// Wallet that authorizes the transfer and pays fees and rent
    pub fn with_sender(mut self, sender: Pubkey) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Sender token account; defaults to the sender's associated account
    pub fn with_source(mut self, source: Pubkey) -> Self {
        self.source = Some(source);
        self
    }

    /// Recipient wallet (not its token account)
    pub fn with_recipient(mut self, recipient: Pubkey) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Amount in base units
    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Prepend creation of the recipient's associated token account
    pub fn create_recipient_account(mut self, create: bool) -> Self {
        self.create_recipient_account = create;
        self
    }

    pub fn recipient_token_account(&self) -> Option<Pubkey> {
        self.recipient
            .map(|recipient| utils::derive_token_account(&recipient, &self.mint))
    }

    /// Position of `transfer_checked` in the built batch
    pub fn transfer_index(&self) -> usize {
        usize::from(self.create_recipient_account)
    }

    pub fn build_instructions(&self) -> Result<Vec<Instruction>> {
        let sender = self
            .sender
            .ok_or_else(|| SnaxSdkError::InvalidAddress("sender required".to_string()))?;
        let recipient = self
            .recipient
            .ok_or_else(|| SnaxSdkError::InvalidAddress("recipient required".to_string()))?;
        if self.amount == 0 {
            return Err(SnaxSdkError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }

        let source = self
            .source
            .unwrap_or_else(|| utils::derive_token_account(&sender, &self.mint));
        let destination = utils::derive_token_account(&recipient, &self.mint);

        let mut instructions = Vec::with_capacity(2);
        if self.create_recipient_account {
            instructions.push(
                spl_associated_token_account::instruction::create_associated_token_account(
                    &sender,
                    &recipient,
                    &self.mint,
                    &spl_token::id(),
                ),
            );
        }

        let transfer = spl_token::instruction::transfer_checked(
            &spl_token::id(),
            &source,
            &self.mint,
            &destination,
            &sender,
            &[],
            self.amount,
            self.decimals,
        )
        .map_err(|e| SnaxSdkError::Unknown(format!("transfer instruction: {}", e)))?;
        instructions.push(transfer);

        Ok(instructions)
    }

    /// Unsigned transaction with the sender as fee payer
    pub fn build_transaction(&self, liveness: &Liveness) -> Result<Transaction> {
        let instructions = self.build_instructions()?;
        let payer = self
            .sender
            .ok_or_else(|| SnaxSdkError::InvalidAddress("sender required".to_string()))?;
        Ok(Transaction::new_unsigned(Message::new_with_blockhash(
            &instructions,
            Some(&payer),
            &liveness.blockhash,
        )))
    }
}
