//! Peer-to-peer transfer validation and balance arithmetic.
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. amount must be positive
//! 2. recipient must be another, non-automated participant
//! 3. sender must hold at least `amount`
//!
//! The first two need no store access. The third runs against the
//! balances read for the versioned commit, so a concurrent debit forces a
//! re-read instead of an overdraft.

use orbis_core::{Account, EconomyError, Participant};

#[derive(Debug, Clone, Copy, Default)]
pub struct TransferLedger;

impl TransferLedger {
    pub fn new() -> Self {
        Self
    }

    /// Check the amount and the recipient. Returns the amount as units.
    pub fn validate(
        &self,
        sender: &Participant,
        recipient: &Participant,
        amount: i64,
    ) -> Result<u64, EconomyError> {
        if amount <= 0 {
            return Err(EconomyError::InvalidAmount(amount));
        }
        if recipient.id == sender.id {
            return Err(EconomyError::InvalidTarget(
                "cannot transfer to yourself".into(),
            ));
        }
        if recipient.automated {
            return Err(EconomyError::InvalidTarget(format!(
                "{} is not a participant",
                recipient.id
            )));
        }
        Ok(amount as u64)
    }

    /// New `(sender, recipient)` balances after moving `amount`.
    ///
    /// The pair always sums to the same total as before.
    pub fn settle(
        &self,
        sender: &Account,
        recipient: &Account,
        amount: u64,
    ) -> Result<(u64, u64), EconomyError> {
        let sender_after = sender
            .balance
            .checked_sub(amount)
            .ok_or(EconomyError::InsufficientFunds {
                have: sender.balance,
                need: amount,
            })?;
        let recipient_after = recipient
            .balance
            .checked_add(amount)
            .ok_or(EconomyError::BalanceOverflow)?;
        Ok((sender_after, recipient_after))
    }
}
